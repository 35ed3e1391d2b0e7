//! Rig configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use pantilt_core::ControlConfig;

use crate::error::{RigError, RigResult};

/// Hardware, replay and control settings for one run.
#[derive(Debug, Clone)]
pub struct RigConfig {
    /// Serial port of the pan/tilt servo board
    pub actuator_port: String,
    /// Serial port of the trigger board
    pub trigger_port: String,
    /// Baud rate of both links
    pub baud: u32,
    /// Time the boards need after the port opens (they reset on connect)
    pub link_warmup: Duration,
    /// Write timeout on both links
    pub link_timeout: Duration,
    /// Directory screenshots are written to
    pub screenshot_dir: PathBuf,
    /// Recorded session to replay; required
    pub replay_path: Option<PathBuf>,
    /// Replay pacing in frames per second
    pub replay_fps: f64,
    /// Restart the recording when it ends
    pub replay_loop: bool,
    /// Prometheus listener; metrics are disabled when unset
    pub metrics_addr: Option<SocketAddr>,
    /// Control loop thresholds
    pub control: ControlConfig,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            actuator_port: "COM7".to_string(),
            trigger_port: "COM6".to_string(),
            baud: 9600,
            link_warmup: Duration::from_millis(2000),
            link_timeout: Duration::from_millis(100),
            screenshot_dir: PathBuf::from("screenshots"),
            replay_path: None,
            replay_fps: 30.0,
            replay_loop: false,
            metrics_addr: None,
            control: ControlConfig::default(),
        }
    }
}

impl RigConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup, falling back to defaults
    /// for missing or unparsable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let d = &defaults.control;
        let control = ControlConfig {
            smoothing_window: parse_or(&lookup, "PANTILT_SMOOTHING_WINDOW", d.smoothing_window),
            zone_fraction: parse_or(&lookup, "PANTILT_ZONE_FRACTION", d.zone_fraction),
            dwell_threshold_secs: parse_or(
                &lookup,
                "PANTILT_DWELL_THRESHOLD_SECS",
                d.dwell_threshold_secs,
            ),
            post_trigger_quiet_secs: parse_or(
                &lookup,
                "PANTILT_POST_TRIGGER_QUIET_SECS",
                d.post_trigger_quiet_secs,
            ),
            small_deadzone: parse_or(&lookup, "PANTILT_SMALL_DEADZONE", d.small_deadzone),
            large_deadzone: parse_or(&lookup, "PANTILT_LARGE_DEADZONE", d.large_deadzone),
            move_settle_ms: parse_or(&lookup, "PANTILT_MOVE_SETTLE_MS", d.move_settle_ms),
            nudge_settle_ms: parse_or(&lookup, "PANTILT_NUDGE_SETTLE_MS", d.nudge_settle_ms),
            link_queue_depth: parse_or(&lookup, "PANTILT_LINK_QUEUE_DEPTH", d.link_queue_depth),
        };

        Self {
            actuator_port: lookup("PANTILT_ACTUATOR_PORT").unwrap_or(defaults.actuator_port),
            trigger_port: lookup("PANTILT_TRIGGER_PORT").unwrap_or(defaults.trigger_port),
            baud: parse_or(&lookup, "PANTILT_BAUD", defaults.baud),
            link_warmup: parse_opt(&lookup, "PANTILT_LINK_WARMUP_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.link_warmup),
            link_timeout: parse_opt(&lookup, "PANTILT_LINK_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.link_timeout),
            screenshot_dir: lookup("PANTILT_SCREENSHOT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.screenshot_dir),
            replay_path: lookup("PANTILT_REPLAY_PATH")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            replay_fps: parse_or(&lookup, "PANTILT_REPLAY_FPS", defaults.replay_fps),
            replay_loop: lookup("PANTILT_REPLAY_LOOP")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.replay_loop),
            metrics_addr: parse_opt(&lookup, "PANTILT_METRICS_ADDR"),
            control,
        }
    }

    /// Reject settings the run cannot start with.
    pub fn validate(&self) -> RigResult<()> {
        self.control.validate()?;
        if self.replay_path.is_none() {
            return Err(RigError::configuration("PANTILT_REPLAY_PATH is not set"));
        }
        if !(self.replay_fps.is_finite() && self.replay_fps > 0.0) {
            return Err(RigError::configuration(format!(
                "PANTILT_REPLAY_FPS must be positive, got {}",
                self.replay_fps
            )));
        }
        if self.baud == 0 {
            return Err(RigError::configuration("PANTILT_BAUD must be positive"));
        }
        Ok(())
    }
}

fn parse_opt<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|s| s.trim().parse().ok())
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    parse_opt(lookup, key).unwrap_or(default)
}
