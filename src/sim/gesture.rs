//! Gesture classification
//!
//! Both input modes resolve a physical gesture into at most one [`Verdict`]:
//! - Tilt: armed by a return to neutral, locked for a cooldown after each commit
//! - Swipe: resolved on release by horizontal drag distance

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::sampler::TiltDirection;
use crate::consts::{DEFAULT_COOLDOWN_MS, DEFAULT_SWIPE_THRESHOLD_PX};

/// Outcome of one committed gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Correct,
    Pass,
}

/// Arming/lock flags shared by the gesture state machines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GestureLatch {
    pub armed: bool,
    pub locked: bool,
}

impl GestureLatch {
    pub fn can_commit(&self) -> bool {
        self.armed && !self.locked
    }

    fn commit(&mut self) {
        self.locked = true;
        self.armed = false;
    }
}

/// Tilt-mode classifier
#[derive(Debug, Clone)]
pub struct TiltClassifier {
    latch: GestureLatch,
    cooldown_ms: u64,
    locked_until_ms: Option<u64>,
}

impl TiltClassifier {
    pub fn new(cooldown_ms: u64) -> Self {
        Self {
            latch: GestureLatch::default(),
            cooldown_ms,
            locked_until_ms: None,
        }
    }

    pub fn latch(&self) -> GestureLatch {
        self.latch
    }

    pub fn cooldown_ms(&self) -> u64 {
        self.cooldown_ms
    }

    /// Back to the initial unarmed, unlocked state
    pub fn reset(&mut self) {
        self.latch = GestureLatch::default();
        self.locked_until_ms = None;
    }

    /// Release the lock once the cooldown has elapsed
    pub fn poll(&mut self, now_ms: u64) {
        if let Some(until) = self.locked_until_ms
            && now_ms >= until
        {
            self.latch.locked = false;
            self.locked_until_ms = None;
        }
    }

    /// Feed one classified direction; returns a verdict on commit
    pub fn observe(&mut self, direction: TiltDirection, now_ms: u64) -> Option<Verdict> {
        self.poll(now_ms);

        let verdict = match direction {
            TiltDirection::Neutral => {
                self.latch.armed = true;
                return None;
            }
            TiltDirection::Down => Verdict::Correct,
            TiltDirection::Up => Verdict::Pass,
        };

        if !self.latch.can_commit() {
            return None;
        }
        self.latch.commit();
        self.locked_until_ms = Some(now_ms + self.cooldown_ms);
        Some(verdict)
    }
}

impl Default for TiltClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN_MS)
    }
}

/// Result of releasing a drag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeOutcome {
    Commit(Verdict),
    /// Card springs back to center
    SnapBack,
}

impl SwipeOutcome {
    pub fn verdict(self) -> Option<Verdict> {
        match self {
            SwipeOutcome::Commit(v) => Some(v),
            SwipeOutcome::SnapBack => None,
        }
    }
}

/// Swipe-mode classifier tracking one horizontal drag at a time
#[derive(Debug, Clone)]
pub struct SwipeTracker {
    threshold_px: f32,
    start: Option<Vec2>,
    offset: f32,
}

impl SwipeTracker {
    pub fn new(threshold_px: f32) -> Self {
        Self {
            threshold_px,
            start: None,
            offset: 0.0,
        }
    }

    /// Current horizontal card offset (for animation)
    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn is_dragging(&self) -> bool {
        self.start.is_some()
    }

    pub fn press(&mut self, pos: Vec2) {
        self.start = Some(pos);
        self.offset = 0.0;
    }

    pub fn drag_to(&mut self, pos: Vec2) {
        if let Some(start) = self.start {
            self.offset = pos.x - start.x;
        }
    }

    /// Resolve the drag; the offset always returns to zero
    pub fn release(&mut self) -> SwipeOutcome {
        let dragging = self.start.take().is_some();
        let offset = std::mem::take(&mut self.offset);
        if !dragging {
            return SwipeOutcome::SnapBack;
        }
        Self::resolve(offset, self.threshold_px)
    }

    /// Drop any drag in progress without resolving it
    pub fn cancel(&mut self) {
        self.start = None;
        self.offset = 0.0;
    }

    fn resolve(offset: f32, threshold_px: f32) -> SwipeOutcome {
        if offset > threshold_px {
            SwipeOutcome::Commit(Verdict::Correct)
        } else if offset < -threshold_px {
            SwipeOutcome::Commit(Verdict::Pass)
        } else {
            SwipeOutcome::SnapBack
        }
    }
}

impl Default for SwipeTracker {
    fn default() -> Self {
        Self::new(DEFAULT_SWIPE_THRESHOLD_PX)
    }
}
