//! Lip-sync stages backed by external binaries
//!
//! Speech arrives as `message_{i}.mp3` in a request's scratch directory. The
//! [`AudioConverter`] turns it into `message_{i}.wav`, and the
//! [`PhonemeExtractor`] turns the waveform into a timed mouth-cue transcript.

mod ffmpeg;
mod rhubarb;
pub mod runner;

pub use ffmpeg::Ffmpeg;
pub use rhubarb::Rhubarb;
pub use runner::{ToolError, ToolOutput, probe, run_tool};

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::Result;

/// Transcodes synthesized speech into an uncompressed waveform
#[async_trait]
pub trait AudioConverter: Send + Sync {
    /// Convert `message_{index}.mp3` in `dir` and return the waveform path
    ///
    /// # Errors
    ///
    /// Returns `Error::Conversion` if the transcoder is missing or fails
    async fn convert(&self, dir: &Path, index: usize) -> Result<PathBuf>;

    /// Converter name for logging
    fn name(&self) -> &'static str;
}

/// Derives a phoneme/viseme transcript from a waveform
#[async_trait]
pub trait PhonemeExtractor: Send + Sync {
    /// Analyse `message_{index}.wav` in `dir` and return the transcript
    ///
    /// The transcript is passed through to clients unmodified.
    ///
    /// # Errors
    ///
    /// Returns `Error::Extraction` if the extractor is missing, fails, or
    /// writes something that isn't JSON
    async fn extract(&self, dir: &Path, index: usize) -> Result<serde_json::Value>;

    /// Extractor name for logging
    fn name(&self) -> &'static str;
}
