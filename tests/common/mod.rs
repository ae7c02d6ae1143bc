//! Shared test utilities

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use avatar_gateway::config::GatewayConfigFile;
use avatar_gateway::lipsync::{AudioConverter, PhonemeExtractor};
use avatar_gateway::scratch::{MP3, WAV, artifact_name};
use avatar_gateway::{
    Animation, ApiState, ChatPipeline, Config, Error, FacialExpression, ReplyGenerator,
    ReplyMessage, Result, SpeechSynthesizer,
};
use tempfile::TempDir;

/// Write a silent mono WAV, like the recorded canned clips
pub fn write_silent_wav(path: &Path) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44_100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("failed to create wav");
    for _ in 0..4_410 {
        writer.write_sample(0i16).expect("failed to write sample");
    }
    writer.finalize().expect("failed to finalize wav");
}

/// Asset directory holding every canned clip and transcript
#[must_use]
pub fn canned_assets() -> TempDir {
    let dir = tempfile::tempdir().expect("failed to create asset dir");
    for name in ["intro_0", "api_0", "api_1"] {
        write_silent_wav(&dir.path().join(format!("{name}.wav")));
        std::fs::write(
            dir.path().join(format!("{name}.json")),
            r#"{"metadata":{"soundFile":"clip.wav","duration":0.1},"mouthCues":[{"start":0.00,"end":0.10,"value":"X"}]}"#,
        )
        .expect("failed to write transcript");
    }
    dir
}

/// Resolve configuration against `audio_dir` with the given env overrides
///
/// Binaries point nowhere so nothing external is ever run.
pub fn test_config(audio_dir: &Path, vars: &[(&str, &str)]) -> Config {
    let mut env: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    env.insert("AVATAR_AUDIO_DIR".to_string(), audio_dir.display().to_string());
    env.entry("AVATAR_FFMPEG".to_string())
        .or_insert_with(|| "/nonexistent/ffmpeg".to_string());
    env.entry("AVATAR_RHUBARB".to_string())
        .or_insert_with(|| "/nonexistent/rhubarb".to_string());

    Config::from_sources(GatewayConfigFile::default(), |key| env.get(key).cloned())
        .expect("invalid test config")
}

/// Build API state from configuration, as the server does
pub fn production_state(config: Config) -> Arc<ApiState> {
    Arc::new(ApiState::from_config(Arc::new(config)).expect("failed to build state"))
}

/// Build API state around the given pipeline
pub fn state_with_pipeline(config: Config, pipeline: ChatPipeline) -> Arc<ApiState> {
    Arc::new(ApiState {
        config: Arc::new(config),
        pipeline: Arc::new(pipeline),
        voices: None,
    })
}

/// Generator returning a fixed script
pub struct ScriptedGenerator(pub Vec<ReplyMessage>);

impl ScriptedGenerator {
    pub fn two_lines() -> Self {
        Self(vec![
            ReplyMessage::new("Game is game.", Animation::BeingCocky)
                .with_expression(FacialExpression::Smile),
            ReplyMessage::new("Stay locked in.", Animation::Talking),
        ])
    }
}

#[async_trait]
impl ReplyGenerator for ScriptedGenerator {
    async fn generate(&self, _user_text: &str) -> Result<Vec<ReplyMessage>> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Synthesizer writing an ID3-tagged stand-in; fails on the text "fail"
pub struct StubSpeech;

#[async_trait]
impl SpeechSynthesizer for StubSpeech {
    async fn synthesize_to_file(&self, text: &str, path: &Path) -> Result<usize> {
        if text == "fail" {
            return Err(Error::Synthesis("ElevenLabs TTS error 500".to_string()));
        }
        let audio = [b"ID3\x04\x00".as_slice(), text.as_bytes()].concat();
        tokio::fs::write(path, &audio).await?;
        Ok(audio.len())
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Converter writing a silent waveform next to the MP3
pub struct StubConverter;

#[async_trait]
impl AudioConverter for StubConverter {
    async fn convert(&self, dir: &Path, index: usize) -> Result<PathBuf> {
        if !dir.join(artifact_name(index, MP3)).exists() {
            return Err(Error::Conversion("missing mp3".to_string()));
        }
        let wav = dir.join(artifact_name(index, WAV));
        write_silent_wav(&wav);
        Ok(wav)
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Extractor reading the WAV header back and emitting one cue
pub struct StubExtractor;

#[async_trait]
impl PhonemeExtractor for StubExtractor {
    async fn extract(&self, dir: &Path, index: usize) -> Result<serde_json::Value> {
        let reader = hound::WavReader::open(dir.join(artifact_name(index, WAV)))
            .map_err(|e| Error::Extraction(e.to_string()))?;
        let seconds = f64::from(reader.duration()) / f64::from(reader.spec().sample_rate);
        Ok(serde_json::json!({
            "metadata": {"duration": seconds},
            "mouthCues": [{"start": 0.0, "end": seconds, "value": "B"}]
        }))
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Pipeline with every stage stubbed
pub fn stub_pipeline(config: &Config, generator: ScriptedGenerator) -> ChatPipeline {
    ChatPipeline::new(
        Arc::new(StubConverter),
        Arc::new(StubExtractor),
        config.audio_dir.clone(),
        config.scratch_dir.clone(),
        config.llm.max_messages,
    )
    .with_generator(Arc::new(generator))
    .with_synthesizer(Arc::new(StubSpeech))
}

/// Read a response body as JSON
pub async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    serde_json::from_slice(&body).expect("body is not JSON")
}
