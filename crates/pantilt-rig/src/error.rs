//! Rig error types.

use thiserror::Error;

pub type RigResult<T> = Result<T, RigError>;

#[derive(Debug, Error)]
pub enum RigError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("Replay error: {0}")]
    Replay(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Control error: {0}")]
    Control(#[from] pantilt_core::ControlError),
}

impl RigError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn replay(msg: impl Into<String>) -> Self {
        Self::Replay(msg.into())
    }
}
