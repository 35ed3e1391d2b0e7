//! Frame geometry: sizes, target points and the centered zone.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::axis::Axis;

/// Pixel dimensions of a frame. May change between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    /// Create a new frame size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Length of the frame along the dimension an axis is driven by.
    pub fn dimension(&self, axis: Axis) -> u32 {
        match axis {
            Axis::Pan => self.width,
            Axis::Tilt => self.height,
        }
    }

    /// Number of bytes in a tightly packed RGB8 buffer of this size.
    pub fn rgb_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Raw per-frame target position produced by the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TargetSample {
    pub x: f64,
    pub y: f64,
}

impl TargetSample {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn coordinate(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Pan => self.x,
            Axis::Tilt => self.y,
        }
    }
}

/// Target position after the sliding-window mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SmoothedPosition {
    pub x: f64,
    pub y: f64,
}

impl SmoothedPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn coordinate(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Pan => self.x,
            Axis::Tilt => self.y,
        }
    }
}

/// Centered rectangle the target has to stay in. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Zone {
    pub x_min: i64,
    pub x_max: i64,
    pub y_min: i64,
    pub y_max: i64,
}

impl Zone {
    /// Central box covering `fraction` of the frame width and height.
    ///
    /// Uses whole-pixel arithmetic: the box side is `floor(dim * fraction)`
    /// and is laid out symmetrically around `dim / 2`. Must be recomputed
    /// for every frame since the frame size can change.
    pub fn centered(size: FrameSize, fraction: f64) -> Self {
        let (x_min, x_max) = centered_span(size.width, fraction);
        let (y_min, y_max) = centered_span(size.height, fraction);
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Check whether a smoothed position lies inside the zone.
    pub fn contains(&self, position: SmoothedPosition) -> bool {
        (self.x_min as f64..=self.x_max as f64).contains(&position.x)
            && (self.y_min as f64..=self.y_max as f64).contains(&position.y)
    }

    /// Label drawn under the zone by display sinks.
    pub fn label(&self) -> String {
        format!(
            "X:{}-{}, Y:{}-{}",
            self.x_min, self.x_max, self.y_min, self.y_max
        )
    }
}

fn centered_span(dim: u32, fraction: f64) -> (i64, i64) {
    let dim = dim as i64;
    let side = (dim as f64 * fraction).floor() as i64;
    let center = dim / 2;
    (center - side / 2, center + side / 2)
}
