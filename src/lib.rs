//! Tilt Party - forehead word-guessing party game
//!
//! Core modules:
//! - `sim`: Deterministic core (orientation sampling, gesture classification, round state machine)
//! - `score`: Score list tally for the results view
//! - `session`: Screen flow and the per-session context handed to each round
//! - `catalog`: Theme/card content
//! - `settings`: Tunable timing and gesture thresholds
//! - `platform`: Browser sensor and timer glue

pub mod catalog;
pub mod error;
pub mod platform;
pub mod score;
pub mod session;
pub mod settings;
pub mod sim;

pub use catalog::{Catalog, Theme};
pub use error::{GameError, Result};
pub use score::{Tally, tally};
pub use session::{Screen, Session, SessionContext};
pub use settings::{InputMode, Settings};

/// Game configuration constants
pub mod consts {
    /// One clock tick of the countdown and round timer
    pub const SECOND_MS: u64 = 1000;

    /// Countdown before cards appear
    pub const DEFAULT_COUNTDOWN_SECS: u32 = 3;
    /// Length of play
    pub const DEFAULT_ROUND_SECS: u32 = 60;

    /// Lock window after a commit; the feedback flash lasts as long
    pub const DEFAULT_COOLDOWN_MS: u64 = 800;
    /// Horizontal drag distance needed to commit a swipe
    pub const DEFAULT_SWIPE_THRESHOLD_PX: f32 = 100.0;

    /// Grace period for a first orientation reading after permission
    pub const DEFAULT_SENSOR_TIMEOUT_MS: u64 = 3000;
}
