//! Orientation sampling
//!
//! Turns raw device-tilt readings into a coarse [`TiltDirection`] and pushes
//! them down a channel for the round controller. Samples only flow once the
//! platform consent gate has granted access.

use futures_channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Latest raw tilt reading in degrees (either channel may be missing)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OrientationSample {
    pub beta: Option<f32>,
    pub gamma: Option<f32>,
}

impl OrientationSample {
    pub fn beta(beta: f32) -> Self {
        Self {
            beta: Some(beta),
            gamma: None,
        }
    }
}

/// Coarse classified direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TiltDirection {
    /// Held roughly upright against the forehead
    #[default]
    Neutral,
    /// Card face pitched toward the sky
    Up,
    /// Card face pitched toward the ground
    Down,
}

/// Angle bands applied to `|beta|`
///
/// Anything between the bands keeps the previous classification so the
/// direction does not flap at the edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TiltThresholds {
    /// Below this is Down
    pub down_below: f32,
    /// Neutral band lower bound (exclusive)
    pub neutral_low: f32,
    /// Neutral band upper bound (exclusive)
    pub neutral_high: f32,
    /// Above this is Up
    pub up_above: f32,
}

impl Default for TiltThresholds {
    fn default() -> Self {
        Self {
            down_below: 40.0,
            neutral_low: 70.0,
            neutral_high: 110.0,
            up_above: 140.0,
        }
    }
}

impl TiltThresholds {
    /// Bands must be strictly increasing and inside 0..=180
    pub fn is_ordered(&self) -> bool {
        0.0 < self.down_below
            && self.down_below < self.neutral_low
            && self.neutral_low < self.neutral_high
            && self.neutral_high < self.up_above
            && self.up_above < 180.0
    }

    /// Classify one beta angle, or `None` when it falls in a dead zone
    pub fn band(&self, beta: f32) -> Option<TiltDirection> {
        if !beta.is_finite() {
            return None;
        }
        let b = beta.abs();
        if b < self.down_below {
            Some(TiltDirection::Down)
        } else if b > self.up_above {
            Some(TiltDirection::Up)
        } else if b > self.neutral_low && b < self.neutral_high {
            Some(TiltDirection::Neutral)
        } else {
            None
        }
    }

    /// Direction for `sample`, retaining `previous` for dead zones and null readings
    pub fn classify(&self, sample: &OrientationSample, previous: TiltDirection) -> TiltDirection {
        sample
            .beta
            .and_then(|beta| self.band(beta))
            .unwrap_or(previous)
    }
}

/// Sensor consent state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Permission {
    #[default]
    Unrequested,
    Granted,
    Denied,
}

/// Platform consent prompt
pub trait PermissionGate {
    fn request(&mut self) -> Permission;
}

/// Platforms without a consent prompt
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGate;

impl PermissionGate for NoGate {
    fn request(&mut self) -> Permission {
        Permission::Granted
    }
}

/// One accepted sensor tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub sample: OrientationSample,
    pub direction: TiltDirection,
}

/// Device orientation sampler
#[derive(Debug)]
pub struct OrientationSampler {
    thresholds: TiltThresholds,
    permission: Permission,
    granted_at_ms: Option<u64>,
    latest: OrientationSample,
    direction: TiltDirection,
    /// Readings with a usable beta value
    live_readings: u64,
    tx: UnboundedSender<SensorReading>,
}

impl OrientationSampler {
    /// Create a sampler and the receiving end of its reading channel
    pub fn new(thresholds: TiltThresholds) -> (Self, UnboundedReceiver<SensorReading>) {
        let (tx, rx) = unbounded();
        let sampler = Self {
            thresholds,
            permission: Permission::Unrequested,
            granted_at_ms: None,
            latest: OrientationSample::default(),
            direction: TiltDirection::Neutral,
            live_readings: 0,
            tx,
        };
        (sampler, rx)
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    pub fn direction(&self) -> TiltDirection {
        self.direction
    }

    pub fn latest(&self) -> OrientationSample {
        self.latest
    }

    /// Ask the consent gate. A denial is final for this sampler.
    pub fn request_permission<G: PermissionGate + ?Sized>(
        &mut self,
        gate: &mut G,
        now_ms: u64,
    ) -> Permission {
        if self.permission == Permission::Unrequested {
            let result = gate.request();
            self.resolve_permission(result, now_ms);
        }
        self.permission
    }

    /// Record the outcome of an asynchronous consent prompt
    pub fn resolve_permission(&mut self, result: Permission, now_ms: u64) {
        if self.permission == Permission::Denied {
            return;
        }
        match result {
            Permission::Granted => {
                if self.permission != Permission::Granted {
                    log::debug!("Orientation permission granted");
                    self.granted_at_ms = Some(now_ms);
                }
                self.permission = Permission::Granted;
            }
            Permission::Denied => {
                log::warn!("Orientation permission denied");
                self.permission = Permission::Denied;
            }
            Permission::Unrequested => {}
        }
    }

    /// Fails unless sensor access has been granted
    pub fn ensure_granted(&self) -> Result<()> {
        match self.permission {
            Permission::Granted => Ok(()),
            Permission::Denied | Permission::Unrequested => Err(GameError::PermissionDenied),
        }
    }

    /// Feed one raw sensor tick. Returns the reading if it was accepted.
    pub fn on_sample(&mut self, sample: OrientationSample) -> Option<SensorReading> {
        if self.permission != Permission::Granted {
            return None;
        }

        self.latest = sample;
        if sample.beta.is_some_and(f32::is_finite) {
            self.live_readings += 1;
        }
        self.direction = self.thresholds.classify(&sample, self.direction);

        let reading = SensorReading {
            sample,
            direction: self.direction,
        };
        // Receiver gone means the round was torn down; nothing left to notify
        let _ = self.tx.unbounded_send(reading);
        Some(reading)
    }

    /// Fails when access was granted `timeout_ms` ago and nothing usable has arrived
    pub fn check_alive(&self, now_ms: u64, timeout_ms: u64) -> Result<()> {
        match self.granted_at_ms {
            Some(granted)
                if self.live_readings == 0 && now_ms.saturating_sub(granted) >= timeout_ms =>
            {
                log::warn!("No orientation readings {}ms after permission grant", timeout_ms);
                Err(GameError::SensorUnavailable)
            }
            _ => Ok(()),
        }
    }
}
