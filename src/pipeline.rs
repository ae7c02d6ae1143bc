//! Chat pipeline: reply generation, speech, lip-sync, encoding
//!
//! A request with no text gets the canned intro and a gateway without API
//! keys gets the canned reminder; neither touches an upstream. Otherwise the
//! generated replies are voiced concurrently inside a private scratch
//! directory and returned in generation order. Any stage failure fails the
//! whole request.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::future::try_join_all;
use serde::Serialize;
use tracing::Instrument;

use crate::canned;
use crate::config::Config;
use crate::lipsync::{AudioConverter, Ffmpeg, PhonemeExtractor, Rhubarb};
use crate::reply::{OpenAiGenerator, ReplyGenerator, ReplyMessage};
use crate::scratch::{MP3, ScratchDir};
use crate::speech::{ElevenLabs, SpeechSynthesizer};
use crate::{Error, Result};

/// A reply with its voice and mouth cues attached
#[derive(Debug, Clone, Serialize)]
pub struct SpokenReply {
    #[serde(flatten)]
    pub message: ReplyMessage,
    /// Base64-encoded audio
    pub audio: String,
    /// Mouth-cue transcript, passed through as produced
    pub lipsync: serde_json::Value,
}

/// Body of a successful `/chat` response
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub messages: Vec<SpokenReply>,
}

/// Runs chat requests through the configured stages
pub struct ChatPipeline {
    generator: Option<Arc<dyn ReplyGenerator>>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    converter: Arc<dyn AudioConverter>,
    extractor: Arc<dyn PhonemeExtractor>,
    audio_dir: PathBuf,
    scratch_dir: PathBuf,
    max_messages: usize,
}

impl ChatPipeline {
    /// Create a pipeline with no upstreams; requests get canned replies until
    /// a generator and synthesizer are attached
    #[must_use]
    pub fn new(
        converter: Arc<dyn AudioConverter>,
        extractor: Arc<dyn PhonemeExtractor>,
        audio_dir: PathBuf,
        scratch_dir: PathBuf,
        max_messages: usize,
    ) -> Self {
        Self {
            generator: None,
            synthesizer: None,
            converter,
            extractor,
            audio_dir,
            scratch_dir,
            max_messages: max_messages.max(1),
        }
    }

    /// Build the production pipeline
    ///
    /// Upstream clients are only created for keys that are configured.
    ///
    /// # Errors
    ///
    /// Returns error if an HTTP client can't be built
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut pipeline = Self::new(
            Arc::new(Ffmpeg::new(config.tools.ffmpeg.clone(), config.tools.timeout)),
            Arc::new(Rhubarb::new(config.tools.rhubarb.clone(), config.tools.timeout)),
            config.audio_dir.clone(),
            config.scratch_dir.clone(),
            config.llm.max_messages,
        );

        if let Some(key) = config.api_keys.openai() {
            pipeline = pipeline.with_generator(Arc::new(OpenAiGenerator::new(
                key,
                &config.llm,
                config.server.http_timeout,
            )?));
        }
        if let Some(key) = config.api_keys.elevenlabs() {
            pipeline = pipeline.with_synthesizer(Arc::new(ElevenLabs::new(
                key,
                &config.tts,
                config.server.http_timeout,
            )?));
        }

        Ok(pipeline)
    }

    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn ReplyGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    #[must_use]
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Answer a chat message
    ///
    /// # Errors
    ///
    /// Returns the first stage error; no partial response is produced
    pub async fn respond(&self, message: Option<&str>) -> Result<ChatResponse> {
        let Some(text) = message.map(str::trim).filter(|t| !t.is_empty()) else {
            tracing::debug!("empty message, sending intro");
            return Ok(ChatResponse {
                messages: canned::load_all(&canned::INTRO, &self.audio_dir).await?,
            });
        };

        let (Some(generator), Some(synthesizer)) = (&self.generator, &self.synthesizer) else {
            tracing::warn!("API keys not configured, sending reminder");
            return Ok(ChatResponse {
                messages: canned::load_all(&canned::CREDENTIAL_REMINDER, &self.audio_dir).await?,
            });
        };

        let scratch = ScratchDir::create(&self.scratch_dir).await?;
        let span = tracing::info_span!("chat", request_id = %scratch.id());

        let result = async {
            let started = Instant::now();
            let messages = self
                .voice_replies(text, generator.as_ref(), synthesizer.as_ref(), &scratch)
                .await?;
            tracing::info!(
                messages = messages.len(),
                elapsed_ms = elapsed_ms(started),
                "chat complete"
            );
            Ok::<_, Error>(ChatResponse { messages })
        }
        .instrument(span.clone())
        .await;

        if let Err(e) = scratch.remove().await {
            span.in_scope(|| tracing::warn!(error = %e, "failed to remove scratch directory"));
        }

        result
    }

    async fn voice_replies(
        &self,
        text: &str,
        generator: &dyn ReplyGenerator,
        synthesizer: &dyn SpeechSynthesizer,
        scratch: &ScratchDir,
    ) -> Result<Vec<SpokenReply>> {
        let started = Instant::now();
        let mut replies = generator.generate(text).await.inspect_err(|e| {
            tracing::error!(generator = generator.name(), error = %e, "reply generation failed");
        })?;
        tracing::info!(
            generator = generator.name(),
            messages = replies.len(),
            elapsed_ms = elapsed_ms(started),
            "replies generated"
        );

        if replies.len() > self.max_messages {
            tracing::warn!(
                generated = replies.len(),
                max = self.max_messages,
                "too many replies, truncating"
            );
            replies.truncate(self.max_messages);
        }

        try_join_all(
            replies
                .into_iter()
                .enumerate()
                .map(|(index, reply)| self.speak(index, reply, synthesizer, scratch)),
        )
        .await
    }

    async fn speak(
        &self,
        index: usize,
        reply: ReplyMessage,
        synthesizer: &dyn SpeechSynthesizer,
        scratch: &ScratchDir,
    ) -> Result<SpokenReply> {
        let dir = scratch.path();
        let mp3 = scratch.artifact(index, MP3);

        let started = Instant::now();
        let bytes = synthesizer
            .synthesize_to_file(&reply.text, &mp3)
            .await
            .inspect_err(|e| {
                tracing::error!(index, synthesizer = synthesizer.name(), error = %e, "speech synthesis failed");
            })?;
        tracing::debug!(index, bytes, elapsed_ms = elapsed_ms(started), "speech synthesized");

        let started = Instant::now();
        let wav = self.converter.convert(dir, index).await.inspect_err(|e| {
            tracing::error!(index, converter = self.converter.name(), error = %e, "audio conversion failed");
        })?;
        tracing::debug!(index, wav = %wav.display(), elapsed_ms = elapsed_ms(started), "audio converted");

        let started = Instant::now();
        let lipsync = self.extractor.extract(dir, index).await.inspect_err(|e| {
            tracing::error!(index, extractor = self.extractor.name(), error = %e, "lip sync failed");
        })?;
        tracing::debug!(index, elapsed_ms = elapsed_ms(started), "lip sync extracted");

        let audio = tokio::fs::read(&mp3).await?;
        Ok(SpokenReply {
            message: reply,
            audio: STANDARD.encode(audio),
            lipsync,
        })
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
