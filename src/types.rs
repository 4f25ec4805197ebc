use std::fmt;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::SpeechError;

/// A synthetic voice offered by the speech engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    /// Display name; also the key the catalog selects by.
    pub name: String,
    /// Language tag (e.g. `"en-us"`).
    pub lang: String,
    /// Engine-specific token used to pick this voice (espeak-ng: the language
    /// code passed to `-v`).
    pub identifier: String,
    /// Whether the engine reports this voice as its default.
    #[serde(default)]
    pub default: bool,
}

impl Voice {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        let lang = lang.into();
        Self {
            name: name.into(),
            identifier: lang.clone(),
            lang,
            default: false,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.lang)
    }
}

/// A rate or pitch multiplier as produced by a range slider.
///
/// Values are clamped to `[SliderValue::MIN, SliderValue::MAX]` and snapped to
/// `SliderValue::STEP`, so an out-of-range value cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f32", into = "f32")]
pub struct SliderValue(f32);

impl SliderValue {
    pub const MIN: f32 = 0.5;
    pub const MAX: f32 = 2.0;
    pub const STEP: f32 = 0.1;

    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::default();
        }
        let clamped = value.clamp(Self::MIN, Self::MAX);
        let snapped = (clamped / Self::STEP).round() * Self::STEP;
        // Snapping can land a hair outside the bounds in f32.
        Self(snapped.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for SliderValue {
    fn default() -> Self {
        Self(1.0)
    }
}

impl From<f32> for SliderValue {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}

impl From<SliderValue> for f32 {
    fn from(value: SliderValue) -> Self {
        value.0
    }
}

impl fmt::Display for SliderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// Identifies one dispatched playback request; engine events carry it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything the engine needs for one synthesis-and-playback cycle.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(build_fn(validate = "Self::validate", error = "SpeechError"))]
pub struct PlaybackRequest {
    pub id: RequestId,
    #[builder(setter(into))]
    pub text: String,
    /// `None` lets the engine use its default voice.
    #[builder(default)]
    pub voice: Option<Voice>,
    #[builder(default, setter(into))]
    pub rate: SliderValue,
    #[builder(default, setter(into))]
    pub pitch: SliderValue,
}

impl PlaybackRequestBuilder {
    fn validate(&self) -> Result<(), SpeechError> {
        match &self.text {
            Some(text) if text.trim().is_empty() => Err(SpeechError::EmptyText),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Preparing,
    Speaking,
}

impl PlaybackState {
    /// Whether a new start action is currently accepted.
    pub fn accepts_start(self) -> bool {
        self == PlaybackState::Idle
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PlaybackState::Idle => "Speak",
            PlaybackState::Preparing => "Preparing...",
            PlaybackState::Speaking => "Speaking...",
        };
        f.write_str(label)
    }
}

/// Signals published by a speech engine to its subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// Audio output for the request has begun.
    Started(RequestId),
    /// The request finished or was cancelled.
    Ended(RequestId),
    /// The engine's voice list may have changed.
    VoicesChanged,
}
