//! `ElevenLabs` speech synthesis and voice catalog

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};

use super::SpeechSynthesizer;
use crate::config::TtsConfig;
use crate::{Error, Result};

/// `ElevenLabs` API client bound to one voice
pub struct ElevenLabs {
    client: reqwest::Client,
    api_key: SecretString,
    voice_id: String,
    model: String,
    output_format: String,
    base_url: String,
}

impl ElevenLabs {
    /// Create a client for the configured voice
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty or the HTTP client can't be built
    pub fn new(api_key: &str, config: &TtsConfig, timeout: Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "ElevenLabs API key required for TTS".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            api_key: SecretString::from(api_key.to_string()),
            voice_id: config.voice_id.clone(),
            model: config.model.clone(),
            output_format: config.output_format.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Synthesize text to speech
    ///
    /// The response body is streamed and buffered in full; an interrupted
    /// stream fails the whole synthesis.
    ///
    /// # Returns
    ///
    /// Audio bytes in the configured output format (MP3 by default)
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct ElevenLabsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
        }

        let url = format!("{}/v1/text-to-speech/{}", self.base_url, self.voice_id);

        let request = ElevenLabsRequest {
            text,
            model_id: &self.model,
        };

        let response = self
            .client
            .post(&url)
            .query(&[("output_format", self.output_format.as_str())])
            .header("xi-api-key", self.api_key.expose_secret())
            .header("Accept", "audio/mpeg")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Synthesis(format!("ElevenLabs request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Synthesis(format!("ElevenLabs TTS error {status}: {body}")));
        }

        let mut audio = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                Error::Synthesis(format!(
                    "ElevenLabs stream interrupted after {} bytes: {e}",
                    audio.len()
                ))
            })?;
            audio.extend_from_slice(&chunk);
        }

        if audio.is_empty() {
            return Err(Error::Synthesis("ElevenLabs returned no audio".to_string()));
        }

        Ok(audio)
    }

    /// Fetch the account's voice catalog, unmodified
    ///
    /// # Errors
    ///
    /// Returns error if the upstream call fails or doesn't return JSON
    pub async fn list_voices(&self) -> Result<serde_json::Value> {
        let response = self
            .client
            .get(format!("{}/v1/voices", self.base_url))
            .header("xi-api-key", self.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| Error::Synthesis(format!("ElevenLabs request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Synthesis(format!(
                "ElevenLabs voices error {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Synthesis(format!("invalid voices response: {e}")))
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabs {
    async fn synthesize_to_file(&self, text: &str, path: &Path) -> Result<usize> {
        tracing::debug!(voice = %self.voice_id, chars = text.len(), "synthesizing speech");
        let audio = self.synthesize(text).await?;
        tokio::fs::write(path, &audio).await?;
        Ok(audio.len())
    }

    fn name(&self) -> &'static str {
        "elevenlabs"
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Json, Router,
        body::{Body, Bytes},
        extract::{Path as UrlPath, Query},
        http::{HeaderMap, StatusCode},
        routing::{get, post},
    };
    use serde_json::json;

    use super::*;
    use crate::test_support::serve_upstream;

    fn tts_config(base_url: &str) -> TtsConfig {
        TtsConfig {
            voice_id: "voice-123".to_string(),
            model: "eleven_multilingual_v2".to_string(),
            output_format: "mp3_44100_128".to_string(),
            base_url: base_url.to_string(),
        }
    }

    #[test]
    fn test_empty_key_rejected() {
        let result = ElevenLabs::new("", &tts_config("http://localhost"), Duration::from_secs(1));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_synthesize_to_file() {
        async fn tts(
            UrlPath(voice): UrlPath<String>,
            Query(query): Query<std::collections::HashMap<String, String>>,
            headers: HeaderMap,
            Json(body): Json<serde_json::Value>,
        ) -> std::result::Result<Vec<u8>, StatusCode> {
            if voice != "voice-123"
                || query.get("output_format").map(String::as_str) != Some("mp3_44100_128")
                || headers.get("xi-api-key").and_then(|v| v.to_str().ok()) != Some("xi-key")
                || body["model_id"] != "eleven_multilingual_v2"
                || body["text"] != "Game is game."
            {
                return Err(StatusCode::BAD_REQUEST);
            }
            Ok(b"ID3\x04\x00fake-mp3-frames".to_vec())
        }

        let base = serve_upstream(Router::new().route("/v1/text-to-speech/{voice}", post(tts))).await;
        let client = ElevenLabs::new("xi-key", &tts_config(&base), Duration::from_secs(5)).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("message_0.mp3");
        let written = client.synthesize_to_file("Game is game.", &path).await.unwrap();

        let on_disk = std::fs::read(&path).unwrap();
        assert_eq!(written, on_disk.len());
        assert!(on_disk.starts_with(b"ID3"));
    }

    #[tokio::test]
    async fn test_upstream_error_is_synthesis_error() {
        let base = serve_upstream(Router::new().route(
            "/v1/text-to-speech/{voice}",
            post(|| async { (StatusCode::UNAUTHORIZED, "invalid api key") }),
        ))
        .await;
        let client = ElevenLabs::new("bad", &tts_config(&base), Duration::from_secs(5)).unwrap();

        let err = client.synthesize("hello").await.unwrap_err();
        assert!(matches!(err, Error::Synthesis(_)));
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_empty_audio_is_synthesis_error() {
        let base = serve_upstream(Router::new().route(
            "/v1/text-to-speech/{voice}",
            post(|| async { StatusCode::OK }),
        ))
        .await;
        let client = ElevenLabs::new("key", &tts_config(&base), Duration::from_secs(5)).unwrap();

        let err = client.synthesize("hello").await.unwrap_err();
        assert!(matches!(err, Error::Synthesis(_)));
    }

    #[tokio::test]
    async fn test_interrupted_stream_writes_nothing() {
        let base = serve_upstream(Router::new().route(
            "/v1/text-to-speech/{voice}",
            post(|| async {
                Body::from_stream(futures::stream::iter(vec![
                    Ok::<_, std::io::Error>(Bytes::from_static(b"ID3partial")),
                    Err(std::io::Error::other("connection reset")),
                ]))
            }),
        ))
        .await;
        let client = ElevenLabs::new("key", &tts_config(&base), Duration::from_secs(5)).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("message_0.mp3");
        let err = client.synthesize_to_file("hello", &path).await.unwrap_err();

        assert!(matches!(err, Error::Synthesis(_)));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_list_voices_passthrough() {
        let base = serve_upstream(Router::new().route(
            "/v1/voices",
            get(|headers: HeaderMap| async move {
                let key = headers
                    .get("xi-api-key")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({"voices": [{"voice_id": "v1", "name": "Frank"}], "seen_key": key}))
            }),
        ))
        .await;
        let client = ElevenLabs::new("xi-key", &tts_config(&base), Duration::from_secs(5)).unwrap();

        let voices = client.list_voices().await.unwrap();
        assert_eq!(voices["voices"][0]["name"], "Frank");
        assert_eq!(voices["seen_key"], "xi-key");
    }
}
