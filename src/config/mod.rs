//! Configuration management for the avatar gateway
//!
//! Configuration is resolved once at start-up (env > toml > default) and
//! shared read-only between request handlers.

pub mod file;

use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::persona;
use crate::{Error, Result};

pub use file::GatewayConfigFile;

/// Default voice used for synthesis
pub const DEFAULT_VOICE_ID: &str = "tyOLIj8lZWjsjLM1oVZU";

/// Default chat model
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

/// Default TTS model
pub const DEFAULT_TTS_MODEL: &str = "eleven_multilingual_v2";

/// Default TTS output profile (MP3, 44.1 kHz, 128 kbps)
pub const DEFAULT_TTS_FORMAT: &str = "mp3_44100_128";

/// Default OpenAI API base URL
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Default ElevenLabs API base URL
pub const DEFAULT_ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io";

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_TEMPERATURE: f32 = 0.6;
const DEFAULT_MAX_MESSAGES: usize = 2;
const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 60;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Avatar gateway configuration
#[derive(Debug)]
pub struct Config {
    /// API keys
    pub api_keys: ApiKeys,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Reply generation configuration
    pub llm: LlmConfig,

    /// Speech synthesis configuration
    pub tts: TtsConfig,

    /// External binaries
    pub tools: ToolsConfig,

    /// Asset directory holding canned replies
    pub audio_dir: PathBuf,

    /// Root for per-request scratch directories
    pub scratch_dir: PathBuf,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Timeout applied to every upstream HTTP request
    pub http_timeout: Duration,
}

/// Reply generation configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub model: String,
    pub temperature: f32,
    pub base_url: String,
    /// Persona system prompt sent with every request
    pub persona_prompt: String,
    /// Upper bound on reply messages per request
    pub max_messages: usize,
}

/// Speech synthesis configuration
#[derive(Debug, Clone)]
pub struct TtsConfig {
    pub voice_id: String,
    pub model: String,
    pub output_format: String,
    pub base_url: String,
}

/// External binary configuration
#[derive(Debug, Clone)]
pub struct ToolsConfig {
    /// Media transcoder
    pub ffmpeg: PathBuf,

    /// Lip-sync phoneme extractor
    pub rhubarb: PathBuf,

    /// Per-invocation timeout
    pub timeout: Duration,
}

/// API keys for external services
#[derive(Debug, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (reply generation)
    pub openai: Option<SecretString>,

    /// `ElevenLabs` API key (speech synthesis)
    pub elevenlabs: Option<SecretString>,
}

impl ApiKeys {
    /// Whether every key the pipeline needs is present
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.openai.is_some() && self.elevenlabs.is_some()
    }

    /// Borrow the `OpenAI` key
    #[must_use]
    pub fn openai(&self) -> Option<&str> {
        self.openai.as_ref().map(ExposeSecret::expose_secret)
    }

    /// Borrow the `ElevenLabs` key
    #[must_use]
    pub fn elevenlabs(&self) -> Option<&str> {
        self.elevenlabs.as_ref().map(ExposeSecret::expose_secret)
    }
}

impl Config {
    /// Load configuration from the environment and the TOML config file
    ///
    /// A `.env` file in the working directory is applied first when present.
    /// An explicit `config_path` must exist and parse; the default config
    /// file is optional.
    ///
    /// # Errors
    ///
    /// Returns error if the explicit config file is invalid or a setting is out of range
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env file");
        }

        let fc = match config_path {
            Some(path) => file::load_config_file_from(path)?,
            None => file::load_config_file(),
        };

        Self::from_sources(fc, |key| std::env::var(key).ok())
    }

    /// Resolve configuration from a parsed config file and an env lookup
    ///
    /// # Errors
    ///
    /// Returns error if a setting is out of range or the persona prompt can't be read
    pub fn from_sources(fc: GatewayConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_keys = ApiKeys {
            openai: credential(env("OPENAI_API_KEY").or(fc.api_keys.openai)),
            elevenlabs: credential(
                env("ELEVEN_LABS_API_KEY")
                    .or_else(|| env("ELEVENLABS_API_KEY"))
                    .or(fc.api_keys.elevenlabs),
            ),
        };

        let server = ServerConfig {
            port: parse_env(&env, "PORT")
                .or(fc.server.port)
                .unwrap_or(DEFAULT_PORT),
            http_timeout: Duration::from_secs(
                parse_env(&env, "AVATAR_HTTP_TIMEOUT_SECS")
                    .or(fc.server.http_timeout_secs)
                    .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            ),
        };

        let max_messages = parse_env(&env, "AVATAR_MAX_MESSAGES")
            .or(fc.llm.max_messages)
            .unwrap_or(DEFAULT_MAX_MESSAGES);
        if max_messages == 0 {
            return Err(Error::Config("max_messages must be at least 1".to_string()));
        }

        let persona_prompt = match env("AVATAR_PERSONA_PROMPT")
            .map(PathBuf::from)
            .or(fc.llm.persona_prompt)
        {
            Some(path) => {
                let persona = std::fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!(
                        "failed to read persona prompt {}: {e}",
                        path.display()
                    ))
                })?;
                persona::with_response_format(persona.trim(), max_messages)
            }
            None => persona::default_prompt(max_messages),
        };

        let llm = LlmConfig {
            model: env("AVATAR_LLM_MODEL")
                .or(fc.llm.model)
                .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            temperature: parse_env(&env, "AVATAR_LLM_TEMPERATURE")
                .or(fc.llm.temperature)
                .unwrap_or(DEFAULT_TEMPERATURE),
            base_url: env("OPENAI_BASE_URL")
                .or(fc.llm.base_url)
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            persona_prompt,
            max_messages,
        };

        if !(0.0..=2.0).contains(&llm.temperature) {
            return Err(Error::Config(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                llm.temperature
            )));
        }

        let tts = TtsConfig {
            voice_id: env("AVATAR_VOICE_ID")
                .or(fc.tts.voice_id)
                .unwrap_or_else(|| DEFAULT_VOICE_ID.to_string()),
            model: env("AVATAR_TTS_MODEL")
                .or(fc.tts.model)
                .unwrap_or_else(|| DEFAULT_TTS_MODEL.to_string()),
            output_format: env("AVATAR_TTS_FORMAT")
                .or(fc.tts.output_format)
                .unwrap_or_else(|| DEFAULT_TTS_FORMAT.to_string()),
            base_url: env("ELEVENLABS_BASE_URL")
                .or(fc.tts.base_url)
                .unwrap_or_else(|| DEFAULT_ELEVENLABS_BASE_URL.to_string()),
        };

        let tools = ToolsConfig {
            ffmpeg: resolve_binary(
                env("AVATAR_FFMPEG")
                    .map(PathBuf::from)
                    .or(fc.tools.ffmpeg)
                    .unwrap_or_else(|| PathBuf::from("ffmpeg")),
            )?,
            rhubarb: resolve_binary(
                env("AVATAR_RHUBARB")
                    .map(PathBuf::from)
                    .or(fc.tools.rhubarb)
                    .unwrap_or_else(|| PathBuf::from("./bin/rhubarb")),
            )?,
            timeout: Duration::from_secs(
                parse_env(&env, "AVATAR_TOOL_TIMEOUT_SECS")
                    .or(fc.tools.timeout_secs)
                    .unwrap_or(DEFAULT_TOOL_TIMEOUT_SECS),
            ),
        };

        let audio_dir = env("AVATAR_AUDIO_DIR")
            .map(PathBuf::from)
            .or(fc.paths.audio_dir)
            .unwrap_or_else(|| PathBuf::from("audios"));
        let scratch_dir = env("AVATAR_SCRATCH_DIR")
            .map(PathBuf::from)
            .or(fc.paths.scratch_dir)
            .unwrap_or_else(|| audio_dir.join("scratch"));

        Ok(Self {
            api_keys,
            server,
            llm,
            tts,
            tools,
            audio_dir,
            scratch_dir,
        })
    }
}

/// Treat empty and placeholder keys as absent
fn credential(value: Option<String>) -> Option<SecretString> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "-")
        .map(SecretString::from)
}

/// Parse an env var, ignoring (and logging) values that don't parse
fn parse_env<T: std::str::FromStr>(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = env(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable environment value");
            None
        }
    }
}

/// Anchor relative binary paths like `./bin/rhubarb` to the start-up directory
///
/// Bare names (`ffmpeg`) are left for `PATH` lookup. Subprocesses run with a
/// per-request working directory, so relative paths must not be resolved there.
fn resolve_binary(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() || path.components().count() <= 1 {
        return Ok(path);
    }
    let cwd = std::env::current_dir()
        .map_err(|e| Error::Config(format!("failed to read working directory: {e}")))?;
    Ok(cwd.join(path))
}
