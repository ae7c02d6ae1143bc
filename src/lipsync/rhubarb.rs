//! Phoneme extraction through Rhubarb Lip Sync

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use super::PhonemeExtractor;
use super::runner::run_tool;
use crate::scratch::{JSON, WAV, artifact_name};
use crate::{Error, Result};

/// Recognizer that works for any language; the default one is English-only
const RECOGNIZER: &str = "phonetic";

/// `rhubarb` phoneme extractor
#[derive(Debug, Clone)]
pub struct Rhubarb {
    binary: PathBuf,
    timeout: Duration,
}

impl Rhubarb {
    #[must_use]
    pub const fn new(binary: PathBuf, timeout: Duration) -> Self {
        Self { binary, timeout }
    }

    fn args(index: usize) -> [String; 7] {
        [
            "-f".to_string(),
            "json".to_string(),
            "-o".to_string(),
            artifact_name(index, JSON),
            artifact_name(index, WAV),
            "-r".to_string(),
            RECOGNIZER.to_string(),
        ]
    }
}

#[async_trait]
impl PhonemeExtractor for Rhubarb {
    async fn extract(&self, dir: &Path, index: usize) -> Result<serde_json::Value> {
        run_tool(&self.binary, Self::args(index), dir, self.timeout)
            .await
            .map_err(|e| Error::Extraction(e.to_string()))?;

        let path = dir.join(artifact_name(index, JSON));
        let content = tokio::fs::read(&path).await.map_err(|e| {
            Error::Extraction(format!("failed to read {}: {e}", path.display()))
        })?;
        serde_json::from_slice(&content).map_err(|e| {
            Error::Extraction(format!("invalid transcript in {}: {e}", path.display()))
        })
    }

    fn name(&self) -> &'static str {
        "rhubarb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args() {
        assert_eq!(
            Rhubarb::args(0),
            ["-f", "json", "-o", "message_0.json", "message_0.wav", "-r", "phonetic"]
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let rhubarb = Rhubarb::new(
            PathBuf::from("definitely-not-rhubarb-7f3a"),
            Duration::from_secs(5),
        );

        let err = rhubarb.extract(dir.path(), 0).await.unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_reads_transcript_written_next_to_wav() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("message_2.json"),
            r#"{"metadata":{"duration":0.5},"mouthCues":[{"start":0.0,"end":0.5,"value":"X"}]}"#,
        )
        .unwrap();
        let rhubarb = Rhubarb::new(PathBuf::from("true"), Duration::from_secs(5));

        let transcript = rhubarb.extract(dir.path(), 2).await.unwrap();
        assert_eq!(transcript["mouthCues"][0]["value"], "X");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_garbage_transcript_is_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("message_0.json"), "not json").unwrap();
        let rhubarb = Rhubarb::new(PathBuf::from("true"), Duration::from_secs(5));

        let err = rhubarb.extract(dir.path(), 0).await.unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }
}
