//! Frame clock for the single-threaded update loop
//!
//! Converts raw frame deltas into clamped, scaled [`Duration`]s that drive
//! emitter disposal timers.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Configuration for the frame clock
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// How many clock seconds pass per real second
    pub time_scale: f32,
    /// Maximum delta per frame, in seconds, to avoid huge catch-up steps
    pub max_delta_time: f32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            max_delta_time: 0.25,
        }
    }
}

impl ClockConfig {
    /// Replace values that would stall or break the clock with their
    /// defaults. Both fields must be finite and positive.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let mut config = self;
        if !(config.time_scale.is_finite() && config.time_scale > 0.0) {
            warn!(
                "Invalid clock time_scale {}, using {}",
                config.time_scale, defaults.time_scale
            );
            config.time_scale = defaults.time_scale;
        }
        if !(config.max_delta_time.is_finite() && config.max_delta_time > 0.0) {
            warn!(
                "Invalid clock max_delta_time {}, using {}",
                config.max_delta_time, defaults.max_delta_time
            );
            config.max_delta_time = defaults.max_delta_time;
        }
        config
    }
}

/// Frame time tracking
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    pub config: ClockConfig,
    /// Time since the clock started
    pub total: Duration,
    /// Delta for the current frame (clamped and scaled)
    pub delta: Duration,
    /// Frame counter
    pub frame_count: u64,
    /// Whether the clock is paused
    pub paused: bool,
}

impl FrameClock {
    /// Create a new clock with custom config
    pub fn new(config: ClockConfig) -> Self {
        Self {
            config: config.sanitized(),
            ..Default::default()
        }
    }

    /// Advance the clock by the raw delta (seconds) of the previous frame.
    /// Returns the delta to feed into per-frame systems.
    pub fn tick(&mut self, raw_delta: f32) -> Duration {
        self.frame_count += 1;

        if self.paused || raw_delta <= 0.0 {
            self.delta = Duration::ZERO;
            return self.delta;
        }

        let clamped = raw_delta.min(self.config.max_delta_time);
        self.delta = Duration::try_from_secs_f32(clamped * self.config.time_scale)
            .unwrap_or(Duration::ZERO);
        self.total += self.delta;
        self.delta
    }

    /// Pause the clock
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume the clock
    pub fn resume(&mut self) {
        self.paused = false;
    }
}
