//! Line-oriented serial links to the servo and trigger boards.

use std::io::Write;
use std::time::Duration;

use serialport::SerialPort;
use tracing::{debug, info};

use pantilt_core::{ActuatorChannel, LinkError, LinkKind, TriggerChannel};
use pantilt_models::{ActuatorCommand, Angle, Axis, TRIGGER_TOKEN};

use crate::error::RigResult;

/// Open a serial port for writing.
pub fn open_serial(path: &str, baud: u32, timeout: Duration) -> RigResult<Box<dyn SerialPort>> {
    info!("Opening serial port: {path} at {baud} bps");

    let port = serialport::new(path, baud).timeout(timeout).open()?;
    Ok(port)
}

/// Writer that sends whole lines and can be closed once.
pub struct LineLink<W: Write + Send> {
    kind: LinkKind,
    name: String,
    writer: Option<W>,
}

impl<W: Write + Send> LineLink<W> {
    pub fn new(kind: LinkKind, name: impl Into<String>, writer: W) -> Self {
        Self {
            kind,
            name: name.into(),
            writer: Some(writer),
        }
    }

    fn write_line(&mut self, line: &[u8]) -> Result<(), LinkError> {
        let kind = self.kind;
        let Some(writer) = self.writer.as_mut() else {
            return Err(LinkError::Closed(kind));
        };
        writer
            .write_all(line)
            .and_then(|_| writer.flush())
            .map_err(|e| LinkError::transient(kind, e.to_string()))
    }

    fn close(&mut self) -> Result<(), LinkError> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };
        debug!(link = %self.kind, port = %self.name, "Closing link");
        writer
            .flush()
            .map_err(|e| LinkError::transient(self.kind, e.to_string()))
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    /// Underlying writer, if the link is still open.
    pub fn get_ref(&self) -> Option<&W> {
        self.writer.as_ref()
    }
}

/// Actuator link speaking `X:<angle>\n` / `Y:<angle>\n`.
pub struct ActuatorLink<W: Write + Send>(LineLink<W>);

impl<W: Write + Send> ActuatorLink<W> {
    pub fn new(name: impl Into<String>, writer: W) -> Self {
        Self(LineLink::new(LinkKind::Actuator, name, writer))
    }

    pub fn inner(&self) -> &LineLink<W> {
        &self.0
    }
}

impl<W: Write + Send> ActuatorChannel for ActuatorLink<W> {
    fn send(&mut self, axis: Axis, angle: Angle) -> Result<(), LinkError> {
        let line = ActuatorCommand::new(axis, angle).encode();
        self.0.write_line(line.as_bytes())
    }

    fn close(&mut self) -> Result<(), LinkError> {
        self.0.close()
    }
}

/// Trigger link sending `go\n`.
pub struct TriggerLink<W: Write + Send>(LineLink<W>);

impl<W: Write + Send> TriggerLink<W> {
    pub fn new(name: impl Into<String>, writer: W) -> Self {
        Self(LineLink::new(LinkKind::Trigger, name, writer))
    }

    pub fn inner(&self) -> &LineLink<W> {
        &self.0
    }
}

impl<W: Write + Send> TriggerChannel for TriggerLink<W> {
    fn send(&mut self) -> Result<(), LinkError> {
        self.0.write_line(TRIGGER_TOKEN)
    }

    fn close(&mut self) -> Result<(), LinkError> {
        self.0.close()
    }
}
