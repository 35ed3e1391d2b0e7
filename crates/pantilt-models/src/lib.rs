//! Shared data models for the PanTilt face-lock controller.
//!
//! This crate provides Serde-serializable types for:
//! - Actuator axes and clamped servo angles
//! - Frame geometry, target samples and the centered zone
//! - Frames and the recorded-session wire format
//! - Actuator/trigger link commands and their ASCII encoding

pub mod angle;
pub mod axis;
pub mod command;
pub mod frame;
pub mod geometry;

// Re-export common types
pub use angle::{Angle, AngleError};
pub use axis::Axis;
pub use command::{ActuatorCommand, MotionDecision, TRIGGER_TOKEN};
pub use frame::{Frame, FrameRecord};
pub use geometry::{FrameSize, SmoothedPosition, TargetSample, Zone};
