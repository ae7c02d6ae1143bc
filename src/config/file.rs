//! TOML configuration file loading
//!
//! Supports `~/.config/avatar-gateway/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfigFile {
    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Language model configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Speech synthesis configuration
    #[serde(default)]
    pub tts: TtsFileConfig,

    /// External binaries
    #[serde(default)]
    pub tools: ToolsFileConfig,

    /// Asset and scratch directories
    #[serde(default)]
    pub paths: PathsFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// API server port
    pub port: Option<u16>,

    /// Timeout for upstream HTTP calls, in seconds
    pub http_timeout_secs: Option<u64>,
}

/// LLM-related configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Model identifier (e.g. "gpt-4o-mini")
    pub model: Option<String>,

    /// Sampling temperature
    pub temperature: Option<f32>,

    /// Chat completions API base URL
    pub base_url: Option<String>,

    /// Path to a file holding the persona system prompt
    pub persona_prompt: Option<PathBuf>,

    /// Upper bound on reply messages per request
    pub max_messages: Option<usize>,
}

/// Speech synthesis configuration
#[derive(Debug, Default, Deserialize)]
pub struct TtsFileConfig {
    /// Voice identifier
    pub voice_id: Option<String>,

    /// TTS model (e.g. "eleven_multilingual_v2")
    pub model: Option<String>,

    /// Output codec/quality profile (e.g. "mp3_44100_128")
    pub output_format: Option<String>,

    /// TTS API base URL
    pub base_url: Option<String>,
}

/// External binary configuration
#[derive(Debug, Default, Deserialize)]
pub struct ToolsFileConfig {
    pub ffmpeg: Option<PathBuf>,
    pub rhubarb: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

/// Directory configuration
#[derive(Debug, Default, Deserialize)]
pub struct PathsFileConfig {
    /// Directory holding the canned reply assets
    pub audio_dir: Option<PathBuf>,

    /// Root under which per-request scratch directories are created
    pub scratch_dir: Option<PathBuf>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub elevenlabs: Option<String>,
}

/// Parse a config file from TOML text
///
/// # Errors
///
/// Returns error if the text is not a valid config file
pub fn parse_config_file(content: &str) -> Result<GatewayConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Load an explicitly requested config file
///
/// # Errors
///
/// Returns error if the file can't be read or parsed
pub fn load_config_file_from(path: &Path) -> Result<GatewayConfigFile> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("failed to read config file {}: {e}", path.display()))
    })?;
    let config = parse_config_file(&content)?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Load the TOML config file from the standard path
///
/// Returns `GatewayConfigFile::default()` if the file doesn't exist or can't be parsed.
#[must_use]
pub fn load_config_file() -> GatewayConfigFile {
    let Some(path) = config_file_path() else {
        return GatewayConfigFile::default();
    };

    if !path.exists() {
        return GatewayConfigFile::default();
    }

    match load_config_file_from(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            GatewayConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/avatar-gateway/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("avatar-gateway").join("config.toml"))
}
