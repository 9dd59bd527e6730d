//! Game settings
//!
//! In-memory only; nothing is persisted between sessions.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{GameError, Result};
use crate::sim::{Language, TiltThresholds};

/// How the player signals correct/pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// Phone on the forehead, pitched down/up
    #[default]
    Tilt,
    /// Card dragged right/left
    Swipe,
}

impl InputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputMode::Tilt => "Tilt",
            InputMode::Swipe => "Swipe",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "tilt" => Some(InputMode::Tilt),
            "swipe" => Some(InputMode::Swipe),
            _ => None,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub input_mode: InputMode,
    /// Language cards are shown and recorded in
    pub language: Language,

    // === Timing ===
    /// Seconds of countdown before play starts
    pub countdown_secs: u32,
    /// Seconds of play per round
    pub round_secs: u32,
    /// Lock window after a commit (also the feedback flash duration)
    pub cooldown_ms: u64,

    // === Gestures ===
    /// Horizontal drag distance needed to commit a swipe
    pub swipe_threshold_px: f32,
    pub tilt: TiltThresholds,
    /// How long to wait for a first orientation reading after permission
    pub sensor_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input_mode: InputMode::Tilt,
            language: Language::En,

            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            round_secs: DEFAULT_ROUND_SECS,
            cooldown_ms: DEFAULT_COOLDOWN_MS,

            swipe_threshold_px: DEFAULT_SWIPE_THRESHOLD_PX,
            tilt: TiltThresholds::default(),
            sensor_timeout_ms: DEFAULT_SENSOR_TIMEOUT_MS,
        }
    }
}

impl Settings {
    /// Parse and validate settings JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.round_secs == 0 {
            return Err(GameError::InvalidSettings("round_secs must be positive".into()));
        }
        if self.cooldown_ms == 0 {
            return Err(GameError::InvalidSettings("cooldown_ms must be positive".into()));
        }
        if !(self.swipe_threshold_px.is_finite() && self.swipe_threshold_px > 0.0) {
            return Err(GameError::InvalidSettings(
                "swipe_threshold_px must be a positive number".into(),
            ));
        }
        if !self.tilt.is_ordered() {
            return Err(GameError::InvalidSettings(format!(
                "tilt bands out of order: {:?}",
                self.tilt
            )));
        }
        Ok(())
    }

    /// Switch input mode (swipe is the fallback when motion is denied)
    pub fn with_input_mode(mut self, mode: InputMode) -> Self {
        self.input_mode = mode;
        self
    }
}
