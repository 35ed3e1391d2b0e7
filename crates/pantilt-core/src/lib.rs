//! Closed-loop centering control for the PanTilt face-lock controller.
//!
//! This crate turns a noisy per-frame target position into:
//! - Rate-limited, hysteresis-gated pan/tilt commands
//! - A dwell timer driving a debounced one-shot trigger
//!
//! Hardware links, frame sources and sinks are consumed through traits;
//! concrete implementations live in `pantilt-rig`.

pub mod centering;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod gate;
pub mod link;
pub mod mapping;
pub mod metrics;
pub mod pipeline;
pub mod runner;
pub mod smoothing;
pub mod state;

#[cfg(test)]
mod tests;

pub use centering::{CenteringState, CenteringStateMachine, Transition, TriggerStatus};
pub use config::ControlConfig;
pub use dispatch::{LinkDispatcher, LinkReport, LinkRequest};
pub use error::{ControlError, ControlResult, LinkError, LinkKind, SinkError};
pub use gate::{GateOutcome, Hysteresis, MotionGate};
pub use link::{ActuatorChannel, TriggerChannel};
pub use mapping::map_to_angle;
pub use pipeline::{DisplaySink, FrameSource, Overlay, PositionEstimator, ScreenshotSink};
pub use runner::{screenshot_file_name, ControlLoop, RunEnd, RunSummary};
pub use smoothing::SmoothingFilter;
pub use state::{AxisCommand, ControlLoopState, TickReport};
