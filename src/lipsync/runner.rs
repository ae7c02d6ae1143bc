//! External binary execution via subprocess
//!
//! Commands are built as argument vectors, never through a shell, and always
//! run with an explicit working directory and timeout.

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

/// Timeout for `--version` style availability probes
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Failure running an external binary
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{} not found", .0.display())]
    NotFound(PathBuf),

    #[error("{} timed out after {after:?}", program.display())]
    TimedOut { program: PathBuf, after: Duration },

    #[error("{} exited with code {code}: {stderr}", program.display())]
    Failed {
        program: PathBuf,
        code: i32,
        stderr: String,
    },

    #[error("failed to run {}: {source}", program.display())]
    Io {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Captured output of a successful run
#[derive(Debug)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
}

/// Run `program` with `args` in `cwd`, killing it if it outlives `limit`
///
/// # Errors
///
/// Returns error if the binary is missing, times out, or exits non-zero
pub async fn run_tool<I, S>(
    program: &Path,
    args: I,
    cwd: &Path,
    limit: Duration,
) -> Result<ToolOutput, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| spawn_error(program, e))?;

    let output = timeout(limit, child.wait_with_output())
        .await
        .map_err(|_| ToolError::TimedOut {
            program: program.to_path_buf(),
            after: limit,
        })?
        .map_err(|e| ToolError::Io {
            program: program.to_path_buf(),
            source: e,
        })?;

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    if !output.status.success() {
        return Err(ToolError::Failed {
            program: program.to_path_buf(),
            code: output.status.code().unwrap_or(-1),
            stderr,
        });
    }

    if !stderr.is_empty() {
        tracing::debug!(program = %program.display(), stderr = %stderr, "tool stderr");
    }

    Ok(ToolOutput {
        stdout: output.stdout,
        stderr,
    })
}

/// Check whether `program` is installed and answers a version query
///
/// Bare names are looked up on `PATH`. Explicit paths only need to exist, so
/// a configured file that can't be executed surfaces as an error.
/// Missing binaries, non-zero exits and hangs all count as unavailable.
///
/// # Errors
///
/// Returns error only for unexpected I/O failures (e.g. permission denied)
pub async fn probe(program: &Path, version_arg: &str) -> Result<bool, ToolError> {
    let found = if program.components().count() > 1 {
        tokio::fs::metadata(program)
            .await
            .is_ok_and(|m| m.is_file())
    } else {
        which::which(program).is_ok()
    };
    if !found {
        tracing::debug!(program = %program.display(), "binary not found");
        return Ok(false);
    }

    let cwd = std::env::current_dir().map_err(|e| ToolError::Io {
        program: program.to_path_buf(),
        source: e,
    })?;

    match run_tool(program, [version_arg], &cwd, PROBE_TIMEOUT).await {
        Ok(_) => Ok(true),
        Err(ToolError::NotFound(_) | ToolError::TimedOut { .. } | ToolError::Failed { .. }) => {
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

fn spawn_error(program: &Path, e: io::Error) -> ToolError {
    if e.kind() == io::ErrorKind::NotFound {
        ToolError::NotFound(program.to_path_buf())
    } else {
        ToolError::Io {
            program: program.to_path_buf(),
            source: e,
        }
    }
}
