//! Per-request scratch directories
//!
//! Every chat request writes its intermediate audio and transcripts into a
//! private `req-<uuid>` directory under the configured scratch root. The
//! pipeline removes it with [`ScratchDir::remove`] once the request finishes,
//! whether it succeeded or not. Dropping a [`ScratchDir`] also removes it, so
//! a cancelled request leaves nothing behind.
//!
//! Filesystem work runs on the blocking pool.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use uuid::Uuid;

use crate::{Error, Result};

/// Synthesized speech
pub const MP3: &str = "mp3";

/// Uncompressed waveform fed to the phoneme extractor
pub const WAV: &str = "wav";

/// Phoneme transcript
pub const JSON: &str = "json";

/// File name of the artifact for the reply at `index`
#[must_use]
pub fn artifact_name(index: usize, ext: &str) -> String {
    format!("message_{index}.{ext}")
}

/// Private working directory for one request
#[derive(Debug)]
pub struct ScratchDir {
    id: Uuid,
    dir: TempDir,
}

impl ScratchDir {
    /// Create a fresh directory under `root`, creating `root` if needed
    ///
    /// # Errors
    ///
    /// Returns error if the directory can't be created
    pub async fn create(root: &Path) -> Result<Self> {
        let root = root.to_path_buf();
        let id = Uuid::new_v4();
        let dir = tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&root)?;
            tempfile::Builder::new()
                .prefix(&format!("req-{id}"))
                .rand_bytes(0)
                .tempdir_in(&root)
        })
        .await
        .map_err(join_error)??;
        Ok(Self { id, dir })
    }

    /// Delete the directory and everything in it
    ///
    /// # Errors
    ///
    /// Returns error if the directory can't be removed
    pub async fn remove(self) -> Result<()> {
        tokio::task::spawn_blocking(move || self.dir.close())
            .await
            .map_err(join_error)??;
        Ok(())
    }

    /// Request identifier, also used in log spans
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Full path of the artifact for the reply at `index`
    #[must_use]
    pub fn artifact(&self, index: usize, ext: &str) -> PathBuf {
        self.dir.path().join(artifact_name(index, ext))
    }
}

fn join_error(e: tokio::task::JoinError) -> Error {
    Error::Io(std::io::Error::other(e))
}
