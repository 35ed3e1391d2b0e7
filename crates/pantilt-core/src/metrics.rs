//! Control loop metrics.
//!
//! Recorded through the `metrics` facade; the binary decides whether an
//! exporter is installed.

use metrics::{counter, gauge, histogram};

use pantilt_models::{Axis, MotionDecision};

use crate::error::LinkKind;

/// Metric names as constants for consistency.
pub mod names {
    // Frames
    pub const TICKS_TOTAL: &str = "pantilt_ticks_total";
    pub const FRAMES_DROPPED_TOTAL: &str = "pantilt_frames_dropped_total";
    pub const TICK_DURATION_SECONDS: &str = "pantilt_tick_duration_seconds";
    pub const TARGET_MISSES_TOTAL: &str = "pantilt_target_misses_total";

    // Actuator
    pub const COMMANDS_SENT_TOTAL: &str = "pantilt_commands_sent_total";
    pub const COMMANDS_SUPPRESSED_TOTAL: &str = "pantilt_commands_suppressed_total";
    pub const LINK_FAILURES_TOTAL: &str = "pantilt_link_failures_total";

    // Centering
    pub const DWELL_SECONDS: &str = "pantilt_dwell_seconds";
    pub const TRIGGERS_FIRED_TOTAL: &str = "pantilt_triggers_fired_total";
    pub const SCREENSHOTS_TOTAL: &str = "pantilt_screenshots_total";
}

/// Record one processed tick.
pub fn record_tick(duration_secs: f64) {
    counter!(names::TICKS_TOTAL).increment(1);
    histogram!(names::TICK_DURATION_SECONDS).record(duration_secs);
}

/// Record frames overwritten before the tick read them.
pub fn record_frames_dropped(count: u64) {
    if count > 0 {
        counter!(names::FRAMES_DROPPED_TOTAL).increment(count);
    }
}

pub fn record_target_miss() {
    counter!(names::TARGET_MISSES_TOTAL).increment(1);
}

/// Record an enqueued actuator command.
pub fn record_command(axis: Axis, decision: MotionDecision) {
    let labels = [("axis", axis.as_str()), ("decision", decision.as_str())];
    counter!(names::COMMANDS_SENT_TOTAL, &labels).increment(1);
}

/// Record a command held back by the settle interval.
pub fn record_command_suppressed(axis: Axis) {
    counter!(names::COMMANDS_SUPPRESSED_TOTAL, "axis" => axis.as_str()).increment(1);
}

pub fn record_link_failure(link: LinkKind) {
    counter!(names::LINK_FAILURES_TOTAL, "link" => link.as_str()).increment(1);
}

/// Current dwell time; zero when not centered.
pub fn set_dwell_seconds(secs: f64) {
    gauge!(names::DWELL_SECONDS).set(secs);
}

pub fn record_trigger_fired() {
    counter!(names::TRIGGERS_FIRED_TOTAL).increment(1);
}

/// Record a screenshot attempt.
pub fn record_screenshot(saved: bool) {
    let status = if saved { "saved" } else { "failed" };
    counter!(names::SCREENSHOTS_TOTAL, "status" => status).increment(1);
}
