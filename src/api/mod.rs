//! HTTP API server for the avatar gateway

pub mod chat;
mod error;
pub mod health;
pub mod voices;

pub use error::ApiError;

use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::pipeline::ChatPipeline;
use crate::speech::ElevenLabs;
use crate::Result;

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<Config>,
    pub pipeline: Arc<ChatPipeline>,
    /// Voice catalog client.
    /// Present only when an `ElevenLabs` key is configured.
    pub voices: Option<Arc<ElevenLabs>>,
}

impl ApiState {
    /// Build production state from configuration
    ///
    /// # Errors
    ///
    /// Returns error if an upstream HTTP client can't be built
    pub fn from_config(config: Arc<Config>) -> Result<Self> {
        let pipeline = Arc::new(ChatPipeline::from_config(&config)?);
        let voices = config
            .api_keys
            .elevenlabs()
            .map(|key| ElevenLabs::new(key, &config.tts, config.server.http_timeout))
            .transpose()?
            .map(Arc::new);

        Ok(Self {
            config,
            pipeline,
            voices,
        })
    }
}

/// Liveness text for `GET /`
async fn root() -> &'static str {
    "Hello World!"
}

/// Build the router with all routes
#[must_use]
pub fn router(state: Arc<ApiState>) -> Router {
    let router = Router::new()
        .route("/", get(root))
        .merge(chat::router(state.clone()))
        .merge(voices::router(state.clone()))
        .merge(health::router(state));

    // CORS layer for cross-origin requests from the avatar frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router.layer(cors).layer(TraceLayer::new_for_http())
}

/// HTTP server bound to one port
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    #[must_use]
    pub const fn new(state: Arc<ApiState>, port: u16) -> Self {
        Self { state, port }
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, router(self.state))
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }
}
