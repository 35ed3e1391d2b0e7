//! Servo angle newtype.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error for angles outside the servo range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("angle {0} is outside [0, 180]")]
pub struct AngleError(pub i64);

/// Servo angle in whole degrees, always within `[0, 180]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Angle(u8);

impl Angle {
    pub const MIN: Angle = Angle(0);
    pub const MAX: Angle = Angle(180);
    /// Neutral position both axes start from.
    pub const NEUTRAL: Angle = Angle(90);

    /// Create an angle, rejecting values outside `[0, 180]`.
    pub fn new(degrees: i64) -> Result<Self, AngleError> {
        if (0..=180).contains(&degrees) {
            Ok(Self(degrees as u8))
        } else {
            Err(AngleError(degrees))
        }
    }

    /// Create an angle, saturating at the servo limits.
    pub fn saturating(degrees: i64) -> Self {
        Self(degrees.clamp(0, 180) as u8)
    }

    /// Degrees as an integer.
    pub fn degrees(&self) -> u8 {
        self.0
    }

    /// Absolute difference in degrees.
    pub fn abs_diff(&self, other: Angle) -> u8 {
        self.0.abs_diff(other.0)
    }
}

impl Default for Angle {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl TryFrom<i64> for Angle {
    type Error = AngleError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Angle> for u8 {
    fn from(angle: Angle) -> Self {
        angle.0
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
