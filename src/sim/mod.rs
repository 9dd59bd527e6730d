//! Deterministic game core
//!
//! All round logic lives here. This module must stay platform-free:
//! - Time only advances through explicit calls
//! - Seeded RNG only
//! - Sensor input arrives over a channel, never from a callback

pub mod deck;
pub mod gesture;
pub mod round;
pub mod sampler;
pub mod state;

pub use deck::{Card, Deck, Language};
pub use gesture::{GestureLatch, SwipeOutcome, SwipeTracker, TiltClassifier, Verdict};
pub use round::{PointerInput, RoundController, TickInput, tick};
pub use sampler::{
    NoGate, OrientationSample, OrientationSampler, Permission, PermissionGate, SensorReading,
    TiltDirection, TiltThresholds,
};
pub use state::{Feedback, RoundEvent, RoundPhase, RoundState, ScoreEntry};
