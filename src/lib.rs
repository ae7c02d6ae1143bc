//! Avatar Gateway - chat backend for a talking 3D avatar
//!
//! Each chat message is answered with a few short in-character replies. Every
//! reply carries its synthesized voice and a mouth-cue transcript so the
//! frontend can animate the avatar's lips in sync.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 HTTP API (axum)                      │
//! │     /chat  │  /voices  │  /health  │  /             │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                  Chat Pipeline                       │
//! │  Reply (OpenAI) → Speech (ElevenLabs) → Lip-sync    │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │               External binaries                      │
//! │          ffmpeg (mp3 → wav)  │  rhubarb             │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod canned;
pub mod config;
pub mod error;
pub mod lipsync;
pub mod persona;
pub mod pipeline;
pub mod reply;
pub mod scratch;
pub mod speech;

#[cfg(test)]
mod test_support;

pub use api::{ApiServer, ApiState};
pub use config::Config;
pub use error::{Error, Result};
pub use persona::{Animation, FacialExpression};
pub use pipeline::{ChatPipeline, ChatResponse, SpokenReply};
pub use reply::{ReplyGenerator, ReplyMessage};
pub use speech::SpeechSynthesizer;
