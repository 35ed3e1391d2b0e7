//! Hardware side of the PanTilt face-lock controller.
//!
//! Provides:
//! - Serial actuator and trigger links
//! - Recorded-session replay as a frame source
//! - JPEG screenshot persistence
//! - Environment-based configuration

pub mod config;
pub mod display;
pub mod error;
pub mod replay;
pub mod screenshot;
pub mod serial;

pub use config::RigConfig;
pub use display::LogDisplay;
pub use error::{RigError, RigResult};
pub use replay::{LandmarkEstimator, ReplaySource};
pub use screenshot::DiskScreenshotSink;
pub use serial::{open_serial, ActuatorLink, LineLink, TriggerLink};
