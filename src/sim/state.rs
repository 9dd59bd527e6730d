//! Round state and core round types
//!
//! Everything the presentation layer reads about a round in progress lives here.

use serde::{Deserialize, Serialize};

use super::gesture::Verdict;
use crate::consts::SECOND_MS;

/// Current phase of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Pre-round countdown, seconds left before play starts
    Countdown { remaining: u32 },
    /// Cards are live, seconds left on the clock
    Playing { time_remaining: u32 },
    /// Round over; the score list is final
    Finished,
}

impl RoundPhase {
    pub fn is_playing(&self) -> bool {
        matches!(self, RoundPhase::Playing { .. })
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, RoundPhase::Finished)
    }
}

/// One recorded verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub word: String,
    pub status: Verdict,
}

/// Flash shown after a commit; the card advances when it expires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub verdict: Verdict,
    /// Round clock time at which the flash ends
    pub until_ms: u64,
}

/// Notifications for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundEvent {
    Countdown(u32),
    Started,
    TimeTick(u32),
    Committed { entry: ScoreEntry, card_index: usize },
    CardShown(usize),
    Finished { total: usize, correct_count: usize },
}

/// Mutable state of one round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundState {
    pub phase: RoundPhase,
    /// Index of the card on screen
    pub card_index: usize,
    /// Verdicts in commit order
    pub scores: Vec<ScoreEntry>,
    /// Pending flash, if a commit was just made
    pub feedback: Option<Feedback>,
    /// Milliseconds since the round was created
    pub clock_ms: u64,
    /// Clock time of the next once-per-second tick
    pub next_second_ms: u64,
    #[serde(skip)]
    pub(crate) events: Vec<RoundEvent>,
}

impl RoundState {
    pub fn new(countdown_secs: u32) -> Self {
        Self {
            phase: RoundPhase::Countdown {
                remaining: countdown_secs,
            },
            card_index: 0,
            scores: Vec::new(),
            feedback: None,
            clock_ms: 0,
            next_second_ms: SECOND_MS,
            events: vec![RoundEvent::Countdown(countdown_secs)],
        }
    }

    pub(crate) fn emit(&mut self, event: RoundEvent) {
        self.events.push(event);
    }
}
