//! Recorded-session replay.
//!
//! A session log is a JSON Lines file of [`FrameRecord`]s written by an
//! upstream face tracker. Replaying it stands in for the camera and the
//! detector, so the control loop can drive real hardware without either.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::info;

use pantilt_core::{ControlResult, FrameSource, PositionEstimator};
use pantilt_models::{Frame, FrameRecord, TargetSample};

use crate::error::{RigError, RigResult};

/// Frame source replaying a session log at a fixed rate.
pub struct ReplaySource {
    records: Vec<FrameRecord>,
    cursor: usize,
    index: u64,
    looping: bool,
    period: Duration,
    ticker: Option<Interval>,
}

impl ReplaySource {
    /// Load a session log from disk.
    pub fn open(path: &Path, fps: f64, looping: bool) -> RigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let records = parse_session(&contents)
            .map_err(|e| RigError::replay(format!("{}: {}", path.display(), e)))?;

        info!(
            path = %path.display(),
            frames = records.len(),
            fps,
            looping,
            "Loaded recorded session"
        );

        Self::from_records(records, fps, looping)
    }

    pub fn from_records(records: Vec<FrameRecord>, fps: f64, looping: bool) -> RigResult<Self> {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(RigError::replay(format!("invalid replay rate {fps}")));
        }
        Ok(Self {
            records,
            cursor: 0,
            index: 0,
            looping,
            period: Duration::from_secs_f64(1.0 / fps),
            ticker: None,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl FrameSource for ReplaySource {
    async fn next_frame(&mut self) -> ControlResult<Option<Frame>> {
        if self.cursor == self.records.len() {
            if !self.looping || self.records.is_empty() {
                return Ok(None);
            }
            self.cursor = 0;
        }

        let period = self.period;
        let ticker = self.ticker.get_or_insert_with(|| {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });
        ticker.tick().await;

        let record = self.records[self.cursor].clone();
        self.cursor += 1;
        self.index += 1;
        Ok(Some(record.into_frame(self.index)))
    }
}

/// Parse a JSON Lines session, skipping blank lines.
pub fn parse_session(contents: &str) -> Result<Vec<FrameRecord>, String> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            FrameRecord::from_json_line(line).map_err(|e| format!("line {}: {}", i + 1, e))
        })
        .collect()
}

/// Estimator returning the landmark recorded with each frame.
#[derive(Debug, Default)]
pub struct LandmarkEstimator;

impl PositionEstimator for LandmarkEstimator {
    fn estimate(&mut self, frame: &Frame) -> Option<TargetSample> {
        frame.landmark
    }
}
