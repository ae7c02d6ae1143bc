//! Pre-recorded replies served without touching any upstream
//!
//! Each line has a `{name}.wav` recording and a `{name}.json` mouth-cue
//! transcript in the asset directory.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::Result;
use crate::persona::{Animation, FacialExpression};
use crate::pipeline::SpokenReply;
use crate::reply::ReplyMessage;

/// A stored reply and the asset name its audio and transcript live under
#[derive(Debug, Clone, Copy)]
pub struct CannedLine {
    pub name: &'static str,
    pub text: &'static str,
    pub animation: Animation,
    pub facial_expression: Option<FacialExpression>,
}

/// Greeting for an empty message
pub const INTRO: [CannedLine; 1] = [CannedLine {
    name: "intro_0",
    text: "Yo what's up… you cooking or what?",
    animation: Animation::BeingCocky,
    facial_expression: None,
}];

/// Reminder sent while API keys are missing
pub const CREDENTIAL_REMINDER: [CannedLine; 2] = [
    CannedLine {
        name: "api_0",
        text: "Please my dear, don't forget to add your API keys!",
        animation: Animation::Angry,
        facial_expression: Some(FacialExpression::Angry),
    },
    CannedLine {
        name: "api_1",
        text: "You don't want to ruin Wawa Sensei with a crazy ChatGPT and ElevenLabs bill, right?",
        animation: Animation::Laughing,
        facial_expression: Some(FacialExpression::Smile),
    },
];

impl CannedLine {
    /// Load the recording and transcript for this line
    ///
    /// # Errors
    ///
    /// Returns error if either asset is missing or the transcript isn't JSON
    pub async fn load(&self, audio_dir: &Path) -> Result<SpokenReply> {
        let wav_path = audio_dir.join(format!("{}.wav", self.name));
        let json_path = audio_dir.join(format!("{}.json", self.name));

        let audio = tokio::fs::read(&wav_path).await.inspect_err(|e| {
            tracing::error!(path = %wav_path.display(), error = %e, "canned audio unreadable");
        })?;
        let transcript = tokio::fs::read_to_string(&json_path).await.inspect_err(|e| {
            tracing::error!(path = %json_path.display(), error = %e, "canned transcript unreadable");
        })?;

        Ok(SpokenReply {
            message: ReplyMessage {
                text: self.text.to_string(),
                animation: self.animation,
                facial_expression: self.facial_expression,
            },
            audio: STANDARD.encode(audio),
            lipsync: serde_json::from_str(&transcript)?,
        })
    }
}

/// Load a set of canned lines in order
///
/// # Errors
///
/// Returns error if any asset can't be loaded
pub async fn load_all(lines: &[CannedLine], audio_dir: &Path) -> Result<Vec<SpokenReply>> {
    let mut replies = Vec::with_capacity(lines.len());
    for line in lines {
        replies.push(line.load(audio_dir).await?);
    }
    Ok(replies)
}
