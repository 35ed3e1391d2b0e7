//! Collaborators around the control loop: frame acquisition, position
//! estimation, screenshot persistence and display.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pantilt_models::{Frame, SmoothedPosition, TargetSample, Zone};

use crate::error::{ControlResult, SinkError};

/// Source of frames, e.g. a camera or a recorded session.
#[async_trait]
pub trait FrameSource: Send {
    /// Next frame, or `None` once the source is permanently exhausted.
    async fn next_frame(&mut self) -> ControlResult<Option<Frame>>;
}

/// Opaque detector producing at most one target point per frame.
pub trait PositionEstimator: Send {
    fn estimate(&mut self, frame: &Frame) -> Option<TargetSample>;
}

/// Persists the frame captured at the moment the trigger fires.
#[async_trait]
pub trait ScreenshotSink: Send + Sync {
    /// Write `frame` as `file_name` and return the final path.
    async fn persist(&self, frame: Arc<Frame>, file_name: String) -> Result<PathBuf, SinkError>;
}

/// Optional on-screen visualization.
pub trait DisplaySink: Send {
    fn show(&mut self, frame: &Frame, overlay: &Overlay);
}

/// Everything a display needs to draw for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub zone: Zone,
    pub smoothed: Option<SmoothedPosition>,
    /// Time centered in the current dwell
    pub dwell: Option<Duration>,
    /// Whether the trigger fired during the current dwell
    pub fired: bool,
}

impl Overlay {
    pub fn zone_label(&self) -> String {
        self.zone.label()
    }

    /// `"Centered for: 1.3s"` while dwelling.
    pub fn dwell_text(&self) -> Option<String> {
        self.dwell
            .map(|d| format!("Centered for: {:.1}s", d.as_secs_f64()))
    }

    pub fn fired_text(&self) -> Option<&'static str> {
        self.fired.then_some("Screenshot Taken!")
    }

    /// Text lines in drawing order.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![self.zone_label()];
        lines.extend(self.dwell_text());
        lines.extend(self.fired_text().map(str::to_string));
        lines
    }
}
