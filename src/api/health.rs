//! Health check endpoint

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;

use super::ApiState;
use crate::config::Config;
use crate::lipsync::{ToolError, probe};

/// Health report
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    /// Unix time in seconds
    pub timestamp: f64,
    pub api_keys: KeyStatus,
    pub dependencies: DependencyStatus,
}

/// Presence of each API key
#[derive(Debug, Serialize)]
pub struct KeyStatus {
    pub openai: &'static str,
    pub elevenlabs: &'static str,
}

/// Availability of each external binary
#[derive(Debug, Serialize)]
pub struct DependencyStatus {
    pub ffmpeg: &'static str,
    pub rhubarb: &'static str,
}

impl HealthReport {
    /// Whether every key and binary the pipeline needs is present
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.api_keys.openai == CONFIGURED
            && self.api_keys.elevenlabs == CONFIGURED
            && self.dependencies.ffmpeg == AVAILABLE
            && self.dependencies.rhubarb == AVAILABLE
    }
}

const CONFIGURED: &str = "configured";
const NOT_CONFIGURED: &str = "not_configured";
const AVAILABLE: &str = "available";
const NOT_AVAILABLE: &str = "not_available";

const fn configured(present: bool) -> &'static str {
    if present { CONFIGURED } else { NOT_CONFIGURED }
}

const fn available(present: bool) -> &'static str {
    if present { AVAILABLE } else { NOT_AVAILABLE }
}

/// Check credentials and probe the external binaries
///
/// # Errors
///
/// Returns error if a probe fails for a reason other than the binary being
/// missing, slow, or exiting non-zero
pub async fn check(config: &Config) -> Result<HealthReport, ToolError> {
    let (ffmpeg, rhubarb) = tokio::join!(
        probe(&config.tools.ffmpeg, "-version"),
        probe(&config.tools.rhubarb, "--version"),
    );

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default();

    Ok(HealthReport {
        status: "healthy",
        timestamp,
        api_keys: KeyStatus {
            openai: configured(config.api_keys.openai.is_some()),
            elevenlabs: configured(config.api_keys.elevenlabs.is_some()),
        },
        dependencies: DependencyStatus {
            ffmpeg: available(ffmpeg?),
            rhubarb: available(rhubarb?),
        },
    })
}

/// Health probe - credentials and dependencies
async fn health(State(state): State<Arc<ApiState>>) -> Response {
    #[derive(Serialize)]
    struct Unhealthy {
        status: &'static str,
        error: String,
    }

    match check(&state.config).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(Unhealthy {
                    status: "unhealthy",
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Build health router
#[must_use]
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(state)
}
