//! Frames handed from the acquisition path to the control tick.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::geometry::{FrameSize, TargetSample};

/// One acquired frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Sequence number assigned by the source
    pub index: u64,
    /// Dimensions of this frame
    pub size: FrameSize,
    /// Wall-clock capture time
    pub captured_at: DateTime<Utc>,
    /// Tightly packed RGB8 pixels, when the source carries image data
    pub pixels: Option<Arc<Vec<u8>>>,
    /// Target position recorded alongside the frame by an upstream tracker
    pub landmark: Option<TargetSample>,
}

impl Frame {
    /// Create a frame without pixel data.
    pub fn new(index: u64, size: FrameSize) -> Self {
        Self {
            index,
            size,
            captured_at: Utc::now(),
            pixels: None,
            landmark: None,
        }
    }

    /// Attach RGB8 pixel data.
    pub fn with_pixels(mut self, pixels: Vec<u8>) -> Self {
        self.pixels = Some(Arc::new(pixels));
        self
    }

    /// Attach an upstream landmark.
    pub fn with_landmark(mut self, landmark: Option<TargetSample>) -> Self {
        self.landmark = landmark;
        self
    }

    /// Pixel data, if present and sized for this frame.
    pub fn rgb_pixels(&self) -> Option<&[u8]> {
        self.pixels
            .as_deref()
            .filter(|p| p.len() == self.size.rgb_len())
            .map(|p| p.as_slice())
    }
}

/// One line of a recorded session log (JSON Lines).
///
/// ```json
/// {"width": 800, "height": 600, "x": 412.0, "y": 290.5}
/// {"width": 800, "height": 600}
/// ```
///
/// A record without `x`/`y` is a frame where no target was detected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FrameRecord {
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl FrameRecord {
    /// Parse one JSON line.
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Recorded target, present only when both coordinates are.
    pub fn target(&self) -> Option<TargetSample> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some(TargetSample::new(x, y)),
            _ => None,
        }
    }

    /// Build the frame this record describes.
    pub fn into_frame(self, index: u64) -> Frame {
        let landmark = self.target();
        Frame::new(index, FrameSize::new(self.width, self.height)).with_landmark(landmark)
    }
}
