use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::controller::DEFAULT_PREPARE_DELAY;
use crate::error::SpeechError;
use crate::types::SliderValue;

/// User-adjustable defaults, optionally loaded from a JSON file.
///
/// ```json
/// { "rate": 1.2, "pitch": 0.9, "voice": "English (America)", "prepare_delay_ms": 300 }
/// ```
///
/// Every field is optional; missing ones take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub rate: SliderValue,
    pub pitch: SliderValue,
    /// Preferred voice name; `None` picks the first voice the engine lists.
    pub voice: Option<String>,
    /// Pause between pressing speak and handing the request to the engine.
    pub prepare_delay_ms: u64,
    /// Explicit espeak-ng binary instead of searching PATH.
    pub espeak_binary: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rate: SliderValue::default(),
            pitch: SliderValue::default(),
            voice: None,
            prepare_delay_ms: DEFAULT_PREPARE_DELAY.as_millis() as u64,
            espeak_binary: None,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SpeechError> {
        let content = std::fs::read_to_string(path)?;
        let settings = serde_json::from_str(&content)?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn prepare_delay(&self) -> Duration {
        Duration::from_millis(self.prepare_delay_ms)
    }
}
