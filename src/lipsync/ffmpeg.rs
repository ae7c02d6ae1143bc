//! MP3 → WAV conversion through `ffmpeg`

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use super::AudioConverter;
use super::runner::run_tool;
use crate::scratch::{MP3, WAV, artifact_name};
use crate::{Error, Result};

/// `ffmpeg` transcoder
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    binary: PathBuf,
    timeout: Duration,
}

impl Ffmpeg {
    #[must_use]
    pub const fn new(binary: PathBuf, timeout: Duration) -> Self {
        Self { binary, timeout }
    }

    /// Argument vector for converting the reply at `index`
    fn args(index: usize) -> [String; 6] {
        [
            "-y".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-i".to_string(),
            artifact_name(index, MP3),
            artifact_name(index, WAV),
        ]
    }
}

#[async_trait]
impl AudioConverter for Ffmpeg {
    async fn convert(&self, dir: &Path, index: usize) -> Result<PathBuf> {
        run_tool(&self.binary, Self::args(index), dir, self.timeout)
            .await
            .map_err(|e| Error::Conversion(e.to_string()))?;

        let wav = dir.join(artifact_name(index, WAV));
        if !wav.exists() {
            return Err(Error::Conversion(format!(
                "ffmpeg reported success but {} is missing",
                wav.display()
            )));
        }
        Ok(wav)
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args() {
        assert_eq!(
            Ffmpeg::args(1),
            ["-y", "-loglevel", "error", "-i", "message_1.mp3", "message_1.wav"]
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_conversion_error() {
        let dir = tempfile::tempdir().unwrap();
        let ffmpeg = Ffmpeg::new(
            PathBuf::from("definitely-not-ffmpeg-7f3a"),
            Duration::from_secs(5),
        );

        let err = ffmpeg.convert(dir.path(), 0).await.unwrap_err();
        assert!(matches!(err, Error::Conversion(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_success_without_output_is_conversion_error() {
        let dir = tempfile::tempdir().unwrap();
        let ffmpeg = Ffmpeg::new(PathBuf::from("true"), Duration::from_secs(5));

        let err = ffmpeg.convert(dir.path(), 0).await.unwrap_err();
        assert!(err.to_string().contains("message_0.wav"));
    }
}
