//! Headless display sink.

use tracing::info;

use pantilt_core::{DisplaySink, Overlay};
use pantilt_models::Frame;

/// Display sink that logs overlay text instead of drawing it.
///
/// Only changes are logged, so a steady scene stays quiet.
#[derive(Debug, Default)]
pub struct LogDisplay {
    last: Option<Vec<String>>,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplaySink for LogDisplay {
    fn show(&mut self, frame: &Frame, overlay: &Overlay) {
        // Dwell text only changes in 0.1 s steps
        let lines = overlay.lines();
        if self.last.as_ref() == Some(&lines) {
            return;
        }
        info!(frame = frame.index, overlay = %lines.join(" | "), "Overlay");
        self.last = Some(lines);
    }
}
