//! `OpenAI` chat completions reply generator

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{DEFAULT_GREETING, ReplyGenerator, ReplyMessage, parse_replies};
use crate::config::LlmConfig;
use crate::{Error, Result};

/// Persona reply generator using JSON mode
pub struct OpenAiGenerator {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    temperature: f32,
    base_url: String,
    system_prompt: String,
}

impl OpenAiGenerator {
    /// Create a generator from the LLM configuration
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty or the HTTP client can't be built
    pub fn new(api_key: &str, config: &LlmConfig, timeout: Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for reply generation".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            api_key: SecretString::from(api_key.to_string()),
            model: config.model.clone(),
            temperature: config.temperature,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            system_prompt: config.persona_prompt.clone(),
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    response_format: ResponseFormat,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl ReplyGenerator for OpenAiGenerator {
    async fn generate(&self, user_text: &str) -> Result<Vec<ReplyMessage>> {
        let user_text = if user_text.trim().is_empty() {
            DEFAULT_GREETING
        } else {
            user_text
        };

        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_text,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Generation(format!("OpenAI request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Generation(format!("OpenAI API error {status}: {body}")));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Generation(format!("failed to parse OpenAI response: {e}")))?;

        let content = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| Error::Generation("OpenAI returned no content".to_string()))?;

        tracing::debug!(model = %self.model, content = %content, "model output");

        parse_replies(&content)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
