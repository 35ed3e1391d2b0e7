//! Actuator axes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One axis of the two-axis platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Horizontal axis, driven by the x coordinate.
    Pan,
    /// Vertical axis, driven by the y coordinate.
    Tilt,
}

impl Axis {
    /// Both axes in tick order.
    pub const ALL: [Axis; 2] = [Axis::Pan, Axis::Tilt];

    /// Label used on the actuator wire protocol.
    pub fn wire_label(&self) -> char {
        match self {
            Axis::Pan => 'X',
            Axis::Tilt => 'Y',
        }
    }

    /// Metric/log label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::Pan => "pan",
            Axis::Tilt => "tilt",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_label())
    }
}
