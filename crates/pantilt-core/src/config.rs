//! Configuration for the centering control loop.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ControlError, ControlResult};

/// Thresholds and timings of the control loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlConfig {
    // === Smoothing ===
    /// Number of samples in the sliding-window mean (default: 10)
    pub smoothing_window: usize,

    // === Centering ===
    /// Side of the centered zone as a fraction of the frame (default: 0.2)
    pub zone_fraction: f64,

    /// Time the target must stay centered before the trigger fires (seconds, default: 2.0)
    pub dwell_threshold_secs: f64,

    /// Minimum time after a trigger before the next one (seconds, default: 4.0)
    pub post_trigger_quiet_secs: f64,

    // === Motion gating ===
    /// Angle changes at or below this are ignored (degrees, default: 2)
    pub small_deadzone: u8,

    /// Angle changes above this are a full move (degrees, default: 5)
    pub large_deadzone: u8,

    /// Cooldown after a move on one axis (milliseconds, default: 300)
    pub move_settle_ms: u64,

    /// Cooldown after a nudge on one axis (milliseconds, default: 100)
    pub nudge_settle_ms: u64,

    // === Links ===
    /// Capacity of the queue between the tick and the link worker (default: 16)
    pub link_queue_depth: usize,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            smoothing_window: 10,
            zone_fraction: 0.2,
            dwell_threshold_secs: 2.0,
            post_trigger_quiet_secs: 4.0,
            small_deadzone: 2,
            large_deadzone: 5,
            move_settle_ms: 300,
            nudge_settle_ms: 100,
            link_queue_depth: 16,
        }
    }
}

impl ControlConfig {
    /// Check invariants the loop relies on.
    pub fn validate(&self) -> ControlResult<()> {
        if self.smoothing_window == 0 {
            return Err(ControlError::configuration(
                "smoothing_window must be at least 1",
            ));
        }
        if !(self.zone_fraction > 0.0 && self.zone_fraction <= 1.0) {
            return Err(ControlError::configuration(format!(
                "zone_fraction must be in (0, 1], got {}",
                self.zone_fraction
            )));
        }
        if self.small_deadzone >= self.large_deadzone {
            return Err(ControlError::configuration(format!(
                "small_deadzone ({}) must be below large_deadzone ({})",
                self.small_deadzone, self.large_deadzone
            )));
        }
        if !(self.dwell_threshold_secs.is_finite() && self.dwell_threshold_secs >= 0.0) {
            return Err(ControlError::configuration(
                "dwell_threshold_secs must be a non-negative number",
            ));
        }
        if !(self.post_trigger_quiet_secs.is_finite() && self.post_trigger_quiet_secs >= 0.0) {
            return Err(ControlError::configuration(
                "post_trigger_quiet_secs must be a non-negative number",
            ));
        }
        if self.link_queue_depth == 0 {
            return Err(ControlError::configuration(
                "link_queue_depth must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn dwell_threshold(&self) -> Duration {
        Duration::from_secs_f64(self.dwell_threshold_secs)
    }

    pub fn post_trigger_quiet(&self) -> Duration {
        Duration::from_secs_f64(self.post_trigger_quiet_secs)
    }

    pub fn move_settle(&self) -> Duration {
        Duration::from_millis(self.move_settle_ms)
    }

    pub fn nudge_settle(&self) -> Duration {
        Duration::from_millis(self.nudge_settle_ms)
    }
}
