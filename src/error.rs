//! Error taxonomy
//!
//! Only permission failure is meant to reach the player. Classification and
//! timing never fail; they keep their previous state instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    /// Motion sensor access was refused by the platform consent gate
    #[error("Motion permission denied")]
    PermissionDenied,
    /// Permission was granted but no orientation readings ever arrived
    #[error("Orientation sensor unavailable")]
    SensorUnavailable,
    #[error("Theme has no cards to play")]
    EmptyDeck,
    #[error("Unknown theme: {0}")]
    UnknownTheme(String),
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GameError {
    /// Message suitable for showing to the player
    pub fn user_message(&self) -> &'static str {
        match self {
            GameError::PermissionDenied => {
                "This game needs motion access to detect tilts. Enable it in settings and reload, or play with swipes."
            }
            GameError::SensorUnavailable => {
                "No motion readings from this device. Switch to swipe mode to keep playing."
            }
            _ => "Something went wrong starting the round.",
        }
    }
}

pub type Result<T> = std::result::Result<T, GameError>;
