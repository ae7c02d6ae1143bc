//! Voice catalog pass-through

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};

use super::{ApiError, ApiState};

/// Build voices router
#[must_use]
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/voices", get(voices))
        .with_state(state)
}

/// List the voices available to the configured `ElevenLabs` account
async fn voices(State(state): State<Arc<ApiState>>) -> Result<Json<serde_json::Value>, ApiError> {
    let client = state
        .voices
        .as_ref()
        .ok_or(ApiError::NotConfigured("ElevenLabs API key not configured"))?;

    client.list_voices().await.map(Json).map_err(|e| {
        tracing::error!(error = %e, "voice catalog request failed");
        ApiError::UpstreamFailed(e.to_string())
    })
}
