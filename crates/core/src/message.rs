//! Message plans and assembled messages
//!
//! A `MessagePlan` is one utterance planned by the language model. The
//! pipeline augments it with synthesized audio and timed mouth cues to
//! produce an `AssembledMessage`, the unit the client's playback loop
//! consumes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Facial expression tag rendered by the avatar
///
/// The model occasionally invents tags; unknown ones degrade to the
/// neutral expression instead of failing the whole plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacialExpression {
    Smile,
    Sad,
    Angry,
    Surprised,
    FunnyFace,
    #[default]
    Neutral,
}

impl FacialExpression {
    /// Wire tag as the client expects it
    pub fn as_str(&self) -> &'static str {
        match self {
            FacialExpression::Smile => "smile",
            FacialExpression::Sad => "sad",
            FacialExpression::Angry => "angry",
            FacialExpression::Surprised => "surprised",
            FacialExpression::FunnyFace => "funnyFace",
            FacialExpression::Neutral => "default",
        }
    }

    fn from_tag(tag: &str) -> Self {
        match tag {
            "smile" => FacialExpression::Smile,
            "sad" => FacialExpression::Sad,
            "angry" => FacialExpression::Angry,
            "surprised" => FacialExpression::Surprised,
            "funnyFace" => FacialExpression::FunnyFace,
            _ => FacialExpression::Neutral,
        }
    }
}

impl Serialize for FacialExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FacialExpression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(FacialExpression::from_tag(&tag))
    }
}

/// Body animation tag rendered by the avatar
///
/// Unknown tags degrade to `Idle`, same policy as `FacialExpression`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Animation {
    #[default]
    Idle,
    TalkingOne,
    TalkingThree,
    SadIdle,
    Defeated,
    Angry,
    Surprised,
    DismissingGesture,
    ThoughtfulHeadShake,
}

impl Animation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Animation::Idle => "Idle",
            Animation::TalkingOne => "TalkingOne",
            Animation::TalkingThree => "TalkingThree",
            Animation::SadIdle => "SadIdle",
            Animation::Defeated => "Defeated",
            Animation::Angry => "Angry",
            Animation::Surprised => "Surprised",
            Animation::DismissingGesture => "DismissingGesture",
            Animation::ThoughtfulHeadShake => "ThoughtfulHeadShake",
        }
    }

    fn from_tag(tag: &str) -> Self {
        match tag {
            "TalkingOne" => Animation::TalkingOne,
            "TalkingThree" => Animation::TalkingThree,
            "SadIdle" => Animation::SadIdle,
            "Defeated" => Animation::Defeated,
            "Angry" => Animation::Angry,
            "Surprised" => Animation::Surprised,
            "DismissingGesture" => Animation::DismissingGesture,
            "ThoughtfulHeadShake" => Animation::ThoughtfulHeadShake,
            _ => Animation::Idle,
        }
    }
}

impl Serialize for Animation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Animation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Animation::from_tag(&tag))
    }
}

/// One planned utterance from the conversation planner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePlan {
    /// Text to speak
    pub text: String,
    /// Facial expression during playback
    #[serde(rename = "facialExpression", default)]
    pub facial_expression: FacialExpression,
    /// Body animation during playback
    #[serde(default)]
    pub animation: Animation,
}

impl MessagePlan {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            facial_expression: FacialExpression::default(),
            animation: Animation::default(),
        }
    }
}

/// A timed mouth-shape interval from phoneme analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouthCue {
    /// Viseme tag (Rhubarb shapes A-H plus X for silence)
    pub value: String,
    /// Interval start in seconds
    pub start: f64,
    /// Interval end in seconds
    pub end: f64,
}

/// Ordered mouth cues covering the full audio duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LipSync {
    #[serde(rename = "mouthCues", default)]
    pub mouth_cues: Vec<MouthCue>,
}

impl LipSync {
    /// End time of the last cue, 0.0 when empty
    pub fn duration(&self) -> f64 {
        self.mouth_cues.last().map(|c| c.end).unwrap_or(0.0)
    }
}

/// A message plan augmented with audio and lip-sync data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssembledMessage {
    pub text: String,
    #[serde(rename = "facialExpression")]
    pub facial_expression: FacialExpression,
    pub animation: Animation,
    /// Base64-encoded MP3 bytes
    pub audio: String,
    pub lipsync: LipSync,
}

impl AssembledMessage {
    /// Attach audio and cues to a plan
    pub fn from_plan(plan: MessagePlan, audio: String, lipsync: LipSync) -> Self {
        Self {
            text: plan.text,
            facial_expression: plan.facial_expression,
            animation: plan.animation,
            audio,
            lipsync,
        }
    }
}
