//! Link commands and their ASCII wire encoding.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::angle::Angle;
use crate::axis::Axis;

/// Token written to the trigger link.
pub const TRIGGER_TOKEN: &[u8] = b"go\n";

/// How aggressively the gate decided to move an axis this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionDecision {
    /// Change within the small dead-zone; nothing is sent.
    None,
    /// Small correction with a short settle interval.
    Nudge,
    /// Large correction with a long settle interval.
    Move,
}

impl MotionDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            MotionDecision::None => "none",
            MotionDecision::Nudge => "nudge",
            MotionDecision::Move => "move",
        }
    }
}

impl fmt::Display for MotionDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Absolute position command for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorCommand {
    pub axis: Axis,
    pub angle: Angle,
}

impl ActuatorCommand {
    pub fn new(axis: Axis, angle: Angle) -> Self {
        Self { axis, angle }
    }

    /// Wire form: `"<AXIS>:<ANGLE>\n"`, e.g. `"X:90\n"`.
    pub fn encode(&self) -> String {
        format!("{}:{}\n", self.axis.wire_label(), self.angle)
    }
}
