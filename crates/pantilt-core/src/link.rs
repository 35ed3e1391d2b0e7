//! Outbound actuator and trigger links.
//!
//! Both links are blocking, line-oriented transports. They are driven from
//! the link worker in [`crate::dispatch`], never from the control tick.

use pantilt_models::{Angle, Axis};

use crate::error::LinkError;

/// Link carrying absolute pan/tilt positions.
#[cfg_attr(test, mockall::automock)]
pub trait ActuatorChannel: Send {
    /// Transmit one command. A failed command is dropped, not retried.
    fn send(&mut self, axis: Axis, angle: Angle) -> Result<(), LinkError>;

    /// Release the underlying transport.
    fn close(&mut self) -> Result<(), LinkError>;
}

/// Fire-and-forget link for the external trigger.
#[cfg_attr(test, mockall::automock)]
pub trait TriggerChannel: Send {
    /// Transmit the trigger token.
    fn send(&mut self) -> Result<(), LinkError>;

    /// Release the underlying transport.
    fn close(&mut self) -> Result<(), LinkError>;
}
