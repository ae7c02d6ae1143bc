//! Error types for the avatar gateway

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while producing a spoken reply
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Language model returned nothing usable
    #[error("generation error: {0}")]
    Generation(String),

    /// Text-to-speech error
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Audio transcoding error
    #[error("conversion error: {0}")]
    Conversion(String),

    /// Phoneme extraction error
    #[error("extraction error: {0}")]
    Extraction(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Short machine-readable code for API error bodies
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Generation(_) => "generation_failed",
            Self::Synthesis(_) => "synthesis_failed",
            Self::Conversion(_) => "conversion_failed",
            Self::Extraction(_) => "extraction_failed",
            Self::Config(_) => "not_configured",
            Self::Io(_) | Self::Http(_) | Self::Serialization(_) | Self::Toml(_) => {
                "internal_error"
            }
        }
    }
}
