//! Persona vocabulary and the default system prompt
//!
//! The avatar client maps each [`Animation`] and [`FacialExpression`] name to
//! a clip/blend-shape set, so both vocabularies are closed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Body animation the avatar plays while speaking a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Animation {
    Acknowledging,
    AngryGesture,
    AnnoyedHeadShake,
    BeingCocky,
    DismissingGesture,
    HappyHandGesture,
    HardHeadNod,
    HeadNodYes,
    HipHopDancing,
    LengthyHeadNod,
    LookAwayGesture,
    Rapping,
    RelievedSigh,
    SarcasticHeadNod,
    ShakingHeadNo,
    SillyDancing,
    SillyDancing2,
    StandingArguing,
    Talking,
    ThoughtfulHeadShake,
    WeightShift,
    Yelling,
    Angry,
    Laughing,
}

impl Animation {
    /// Animations the model may choose from
    pub const PERSONA: [Self; 22] = [
        Self::Acknowledging,
        Self::AngryGesture,
        Self::AnnoyedHeadShake,
        Self::BeingCocky,
        Self::DismissingGesture,
        Self::HappyHandGesture,
        Self::HardHeadNod,
        Self::HeadNodYes,
        Self::HipHopDancing,
        Self::LengthyHeadNod,
        Self::LookAwayGesture,
        Self::Rapping,
        Self::RelievedSigh,
        Self::SarcasticHeadNod,
        Self::ShakingHeadNo,
        Self::SillyDancing,
        Self::SillyDancing2,
        Self::StandingArguing,
        Self::Talking,
        Self::ThoughtfulHeadShake,
        Self::WeightShift,
        Self::Yelling,
    ];

    /// Clip name as the avatar client knows it
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Acknowledging => "acknowledging",
            Self::AngryGesture => "angry gesture",
            Self::AnnoyedHeadShake => "annoyed head shake",
            Self::BeingCocky => "Being Cocky",
            Self::DismissingGesture => "dismissing gesture",
            Self::HappyHandGesture => "happy hand gesture",
            // clip is misspelled in the avatar rig
            Self::HardHeadNod => "hard head node",
            Self::HeadNodYes => "head nod yes",
            Self::HipHopDancing => "Hip Hop Dancing",
            Self::LengthyHeadNod => "lengthy head nod",
            Self::LookAwayGesture => "look away gesture",
            Self::Rapping => "Rapping",
            Self::RelievedSigh => "relieved sigh",
            Self::SarcasticHeadNod => "sarcastic head nod",
            Self::ShakingHeadNo => "shaking head no",
            Self::SillyDancing => "Silly Dancing",
            Self::SillyDancing2 => "Silly Dancing 2",
            Self::StandingArguing => "Standing Arguing",
            Self::Talking => "Talking",
            Self::ThoughtfulHeadShake => "thoughtful head shake",
            Self::WeightShift => "weight shift",
            Self::Yelling => "yelling",
            Self::Angry => "Angry",
            Self::Laughing => "Laughing",
        }
    }
}

impl fmt::Display for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Animation {
    type Err = String;

    /// Case-insensitive lookup; models are not consistent about capitalisation
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::PERSONA
            .iter()
            .chain(&[Self::Angry, Self::Laughing])
            .copied()
            .find(|a| a.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown animation: {wanted:?}"))
    }
}

impl TryFrom<String> for Animation {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Animation> for &'static str {
    fn from(value: Animation) -> Self {
        value.name()
    }
}

/// Facial expression blend for a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FacialExpression {
    Default,
    Smile,
    Sad,
    Angry,
    Surprised,
    FunnyFace,
}

impl FacialExpression {
    pub const ALL: [Self; 6] = [
        Self::Default,
        Self::Smile,
        Self::Sad,
        Self::Angry,
        Self::Surprised,
        Self::FunnyFace,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Smile => "smile",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Surprised => "surprised",
            Self::FunnyFace => "funnyFace",
        }
    }
}

impl FromStr for FacialExpression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|e| e.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown facial expression: {wanted:?}"))
    }
}

const PERSONA_INTRO: &str = "\
You are Nova, a quick-witted virtual host who lives inside a 3D avatar on a \
livestream. You are confident, playful and a little theatrical. You keep \
answers short enough to be spoken aloud in a few seconds, you never use \
markdown or emoji, and you stay in character.";

/// Build the built-in persona prompt, including the response format contract
#[must_use]
pub fn default_prompt(max_messages: usize) -> String {
    with_response_format(PERSONA_INTRO, max_messages)
}

/// Append the JSON response contract to a persona description
#[must_use]
pub fn with_response_format(persona: &str, max_messages: usize) -> String {
    let animations = Animation::PERSONA
        .iter()
        .map(|a| a.name())
        .collect::<Vec<_>>()
        .join(", ");
    let expressions = FacialExpression::ALL
        .iter()
        .map(|e| e.name())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "{persona}\n\n\
         You will always reply with a JSON object whose \"messages\" field is an array of messages. With a maximum of {max_messages} messages.\n\
         Each message has a text, and animation property, and optionally a facialExpression.\n\
         The different animations are: {animations}\n\
         The different facial expressions are: {expressions}"
    )
}
