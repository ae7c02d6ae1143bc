//! API error responses

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// API errors, rendered as `{"error": {"code", "message"}}`
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotConfigured(&'static str),
    UpstreamFailed(String),
    Pipeline(crate::Error),
}

impl From<crate::Error> for ApiError {
    fn from(e: crate::Error) -> Self {
        Self::Pipeline(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: String,
        }

        let (status, code, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::NotConfigured(msg) => (StatusCode::SERVICE_UNAVAILABLE, "not_configured", msg.to_string()),
            Self::UpstreamFailed(msg) => (StatusCode::BAD_GATEWAY, "upstream_failed", msg),
            Self::Pipeline(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.code(), e.to_string()),
        };

        (status, Json(ErrorResponse { error: ErrorBody { code, message } })).into_response()
    }
}
