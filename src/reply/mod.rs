//! Reply generation: persona prompt in, short list of scripted replies out

mod openai;

pub use openai::OpenAiGenerator;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::persona::{Animation, FacialExpression};
use crate::{Error, Result};

/// Message sent to the model when the user said nothing
pub const DEFAULT_GREETING: &str = "Hello";

/// One scripted line for the avatar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyMessage {
    pub text: String,
    pub animation: Animation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facial_expression: Option<FacialExpression>,
}

impl ReplyMessage {
    #[must_use]
    pub fn new(text: impl Into<String>, animation: Animation) -> Self {
        Self {
            text: text.into(),
            animation,
            facial_expression: None,
        }
    }

    #[must_use]
    pub const fn with_expression(mut self, expression: FacialExpression) -> Self {
        self.facial_expression = Some(expression);
        self
    }
}

/// Produces the replies for a user message
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Generate replies for `user_text`, in speaking order
    ///
    /// # Errors
    ///
    /// Returns `Error::Generation` if the upstream call fails or its output
    /// doesn't contain at least one valid message
    async fn generate(&self, user_text: &str) -> Result<Vec<ReplyMessage>>;

    /// Generator name for logging
    fn name(&self) -> &'static str;
}

/// Parse and validate model output into replies
///
/// Accepts `{"messages": [...]}`, a bare array, or a single message object.
/// A facial expression outside the vocabulary is dropped with a warning;
/// every other field is strict.
///
/// # Errors
///
/// Returns `Error::Generation` describing the first problem found
pub fn parse_replies(content: &str) -> Result<Vec<ReplyMessage>> {
    let value: Value = serde_json::from_str(content.trim())
        .map_err(|e| Error::Generation(format!("model output is not valid JSON: {e}")))?;

    let items = match value {
        Value::Object(mut map) if map.contains_key("messages") => match map.remove("messages") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(Error::Generation(
                    "\"messages\" in model output is not an array".to_string(),
                ));
            }
        },
        Value::Array(items) => items,
        Value::Object(map) if map.contains_key("text") => vec![Value::Object(map)],
        other => {
            return Err(Error::Generation(format!(
                "expected a JSON array of messages, got {}",
                kind(&other)
            )));
        }
    };

    if items.is_empty() {
        return Err(Error::Generation("model returned no messages".to_string()));
    }

    items
        .iter()
        .enumerate()
        .map(|(i, item)| parse_message(i, item).map_err(|e| Error::Generation(format!("message {i}: {e}"))))
        .collect()
}

fn parse_message(index: usize, item: &Value) -> std::result::Result<ReplyMessage, String> {
    let Value::Object(map) = item else {
        return Err(format!("expected an object, got {}", kind(item)));
    };

    let text = match map.get("text") {
        Some(Value::String(text)) if !text.trim().is_empty() => text.trim().to_string(),
        Some(Value::String(_)) => return Err("text is empty".to_string()),
        Some(other) => return Err(format!("text must be a string, got {}", kind(other))),
        None => return Err("missing text".to_string()),
    };

    let animation = match map.get("animation") {
        Some(Value::String(name)) => name.parse::<Animation>()?,
        Some(other) => return Err(format!("animation must be a string, got {}", kind(other))),
        None => return Err("missing animation".to_string()),
    };

    let facial_expression = match map.get("facialExpression") {
        None | Some(Value::Null) => None,
        Some(Value::String(name)) => name
            .parse::<FacialExpression>()
            .inspect_err(|e| {
                tracing::warn!(reply = index, error = %e, "dropping facial expression");
            })
            .ok(),
        Some(other) => {
            tracing::warn!(
                reply = index,
                kind = kind(other),
                "dropping non-string facial expression"
            );
            None
        }
    };

    Ok(ReplyMessage {
        text,
        animation,
        facial_expression,
    })
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_messages() {
        let replies = parse_replies(
            r#"{"messages": [
                {"text": "Internet capital markets, bro.", "animation": "Being Cocky"},
                {"text": "We ball.", "animation": "talking", "facialExpression": "smile"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].animation, Animation::BeingCocky);
        assert_eq!(replies[0].facial_expression, None);
        assert_eq!(replies[1].text, "We ball.");
        assert_eq!(replies[1].animation, Animation::Talking);
        assert_eq!(replies[1].facial_expression, Some(FacialExpression::Smile));
    }

    #[test]
    fn test_bare_array() {
        let replies =
            parse_replies(r#"[{"text": "Hey.", "animation": "head nod yes"}]"#).unwrap();
        assert_eq!(replies, vec![ReplyMessage::new("Hey.", Animation::HeadNodYes)]);
    }

    #[test]
    fn test_single_object() {
        let replies = parse_replies(r#"{"text": "Yo.", "animation": "Rapping"}"#).unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].animation, Animation::Rapping);
    }

    #[test]
    fn test_null_expression_is_absent() {
        let replies = parse_replies(
            r#"[{"text": "Hm.", "animation": "Talking", "facialExpression": null}]"#,
        )
        .unwrap();
        assert!(replies[0].facial_expression.is_none());
    }

    #[test]
    fn test_invalid_json() {
        let err = parse_replies("Sure! Here are your messages:").unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
    }

    #[test]
    fn test_wrong_shapes() {
        for content in [
            r#"{"messages": "hello"}"#,
            r#"{"reply": "hello"}"#,
            "42",
            r#"[]"#,
            r#"{"messages": []}"#,
            r#"["just a string"]"#,
        ] {
            let err = parse_replies(content).unwrap_err();
            assert!(matches!(err, Error::Generation(_)), "accepted {content}");
        }
    }

    #[test]
    fn test_invalid_fields() {
        for content in [
            r#"[{"animation": "Talking"}]"#,
            r#"[{"text": "   ", "animation": "Talking"}]"#,
            r#"[{"text": 5, "animation": "Talking"}]"#,
            r#"[{"text": "hi"}]"#,
            r#"[{"text": "hi", "animation": "moonwalk"}]"#,
            r#"[{"text": "hi", "animation": 3}]"#,
        ] {
            assert!(parse_replies(content).is_err(), "accepted {content}");
        }
    }

    #[test]
    fn test_unknown_expression_is_dropped() {
        let replies = parse_replies(
            r#"[
                {"text": "Heh.", "animation": "Talking", "facialExpression": "smirk"},
                {"text": "Ok.", "animation": "Talking", "facialExpression": 7},
                {"text": "Nice.", "animation": "Talking", "facialExpression": "FUNNYFACE"}
            ]"#,
        )
        .unwrap();

        assert_eq!(replies.len(), 3);
        assert_eq!(replies[0], ReplyMessage::new("Heh.", Animation::Talking));
        assert!(replies[1].facial_expression.is_none());
        assert_eq!(replies[2].facial_expression, Some(FacialExpression::FunnyFace));
    }

    #[test]
    fn test_error_names_message_index() {
        let err = parse_replies(
            r#"[{"text": "ok", "animation": "Talking"}, {"text": "bad", "animation": "tap dance"}]"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("message 1"));
    }

    #[test]
    fn test_serialized_shape() {
        let reply = ReplyMessage::new("Please", Animation::Angry).with_expression(FacialExpression::Angry);
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"text": "Please", "animation": "Angry", "facialExpression": "angry"})
        );
    }
}
