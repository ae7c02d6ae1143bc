//! Text-to-speech (TTS) processing

mod elevenlabs;

pub use elevenlabs::ElevenLabs;

use std::path::Path;

use async_trait::async_trait;

use crate::Result;

/// Synthesizes speech for a reply and stores it on disk
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` and write the encoded audio to `path`
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns `Error::Synthesis` if the upstream call fails at any point,
    /// including part-way through the audio stream
    async fn synthesize_to_file(&self, text: &str, path: &Path) -> Result<usize>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}
