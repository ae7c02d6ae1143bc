//! Chat endpoint

use std::sync::Arc;

use axum::{Json, Router, body::Bytes, extract::State, routing::post};
use serde::Deserialize;

use super::{ApiError, ApiState};
use crate::pipeline::ChatResponse;

/// Build chat router
#[must_use]
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .with_state(state)
}

/// Chat request; every field is optional
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

/// Answer a chat message with spoken, lip-synced replies
///
/// An empty body is treated like a request without a message.
async fn chat(
    State(state): State<Arc<ApiState>>,
    body: Bytes,
) -> Result<Json<ChatResponse>, ApiError> {
    let request: ChatRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ChatRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("invalid chat request: {e}")))?
    };

    let response = state.pipeline.respond(request.message.as_deref()).await?;
    Ok(Json(response))
}
