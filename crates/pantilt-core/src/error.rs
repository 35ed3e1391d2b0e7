//! Control error types.

use std::fmt;
use thiserror::Error;

pub type ControlResult<T> = Result<T, ControlError>;

/// Which outbound link an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    Actuator,
    Trigger,
}

impl LinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkKind::Actuator => "actuator",
            LinkKind::Trigger => "trigger",
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from an actuator or trigger link.
///
/// Link failures are never fatal to the loop: the command is dropped and
/// the next tick supersedes it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("{link} link I/O failed: {message}")]
    TransientIo { link: LinkKind, message: String },

    #[error("{0} link is closed")]
    Closed(LinkKind),
}

impl LinkError {
    pub fn transient(link: LinkKind, msg: impl Into<String>) -> Self {
        Self::TransientIo {
            link,
            message: msg.into(),
        }
    }

    pub fn link(&self) -> LinkKind {
        match self {
            LinkError::TransientIo { link, .. } => *link,
            LinkError::Closed(link) => *link,
        }
    }
}

/// Errors from a screenshot sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Encoding failed: {0}")]
    Encode(String),

    #[error("Sink task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SinkError {
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Frame source failed: {0}")]
    Source(String),

    #[error("Link error: {0}")]
    Link(#[from] LinkError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
}

impl ControlError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn source_failed(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }
}
