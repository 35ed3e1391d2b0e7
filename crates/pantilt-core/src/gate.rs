//! Per-axis hysteresis and settle-interval rate limiting.
//!
//! Each axis remembers the last angle it sent. A new angle is classified
//! against two dead-zones:
//! - `diff <= small` → no command
//! - `small < diff <= large` → nudge, short settle
//! - `diff > large` → move, long settle
//!
//! While an axis is settling its commands are suppressed without touching
//! its state. The other axis is unaffected.
//!
//! Sends are optimistic: `last_sent` moves as soon as a command is issued.
//! Every command stays in flight until the link reports it, so a failure
//! can restore the angle the actuator will actually end up at.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use pantilt_models::{Angle, Axis, MotionDecision};

use crate::config::ControlConfig;

/// Two-threshold classifier for angle changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hysteresis {
    small: u8,
    large: u8,
}

impl Hysteresis {
    /// Callers must ensure `small < large`; see [`ControlConfig::validate`].
    pub fn new(small: u8, large: u8) -> Self {
        Self { small, large }
    }

    pub fn classify(&self, diff: u8) -> MotionDecision {
        if diff > self.large {
            MotionDecision::Move
        } else if diff > self.small {
            MotionDecision::Nudge
        } else {
            MotionDecision::None
        }
    }
}

/// Result of evaluating one axis for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Change within the small dead-zone.
    Hold,
    /// A command was due but the axis is still settling.
    Suppressed { decision: MotionDecision },
    /// Send `angle` now. `seq` identifies the command in link reports.
    Send {
        decision: MotionDecision,
        angle: Angle,
        seq: u64,
    },
}

#[derive(Debug, Clone)]
struct AxisGate {
    /// Angle the gate measures against; updated optimistically on send.
    last_sent: Angle,
    /// Last angle the link reported as written.
    confirmed: Angle,
    confirmed_seq: u64,
    settle_until: Option<Instant>,
    /// Sequence number of the most recent send.
    seq: u64,
    /// Commands issued but not yet reported, oldest first.
    in_flight: VecDeque<(u64, Angle)>,
}

impl AxisGate {
    fn new() -> Self {
        Self {
            last_sent: Angle::NEUTRAL,
            confirmed: Angle::NEUTRAL,
            confirmed_seq: 0,
            settle_until: None,
            seq: 0,
            in_flight: VecDeque::new(),
        }
    }

    fn settling(&self, now: Instant) -> bool {
        self.settle_until.is_some_and(|until| now < until)
    }

    /// Where the actuator ends up once every in-flight command lands.
    fn expected_position(&self) -> Angle {
        self.in_flight
            .back()
            .map_or(self.confirmed, |&(_, angle)| angle)
    }
}

/// Hysteresis gate for both axes.
#[derive(Debug, Clone)]
pub struct MotionGate {
    hysteresis: Hysteresis,
    move_settle: Duration,
    nudge_settle: Duration,
    axes: [AxisGate; 2],
}

impl MotionGate {
    pub fn new(hysteresis: Hysteresis, move_settle: Duration, nudge_settle: Duration) -> Self {
        Self {
            hysteresis,
            move_settle,
            nudge_settle,
            axes: [AxisGate::new(), AxisGate::new()],
        }
    }

    pub fn from_config(config: &ControlConfig) -> Self {
        Self::new(
            Hysteresis::new(config.small_deadzone, config.large_deadzone),
            config.move_settle(),
            config.nudge_settle(),
        )
    }

    /// Decide whether `target` should be sent on `axis` at `now`.
    pub fn evaluate(&mut self, axis: Axis, target: Angle, now: Instant) -> GateOutcome {
        let move_settle = self.move_settle;
        let nudge_settle = self.nudge_settle;
        let decision = self.hysteresis.classify(target.abs_diff(self.axis(axis).last_sent));

        let settle = match decision {
            MotionDecision::None => return GateOutcome::Hold,
            MotionDecision::Nudge => nudge_settle,
            MotionDecision::Move => move_settle,
        };

        let gate = self.axis_mut(axis);
        if gate.settling(now) {
            return GateOutcome::Suppressed { decision };
        }

        gate.seq += 1;
        gate.last_sent = target;
        gate.settle_until = Some(now + settle);
        gate.in_flight.push_back((gate.seq, target));

        GateOutcome::Send {
            decision,
            angle: target,
            seq: gate.seq,
        }
    }

    /// Record that the link wrote command `seq`.
    pub fn confirm(&mut self, axis: Axis, seq: u64, angle: Angle) {
        let gate = self.axis_mut(axis);
        gate.in_flight.retain(|&(pending, _)| pending > seq);
        if seq > gate.confirmed_seq {
            gate.confirmed_seq = seq;
            gate.confirmed = angle;
        }
    }

    /// Undo command `seq` after a confirmed failure.
    ///
    /// Only the newest in-flight command is rolled back: `last_sent` returns
    /// to where the actuator will settle without it and the settle cooldown
    /// is cleared. Returns `false` for stale reports, which leave the newer
    /// command in place.
    pub fn rollback(&mut self, axis: Axis, seq: u64) -> bool {
        let gate = self.axis_mut(axis);
        let newest = gate.in_flight.back().map(|&(pending, _)| pending);
        gate.in_flight.retain(|&(pending, _)| pending != seq);
        if newest != Some(seq) {
            return false;
        }
        gate.last_sent = gate.expected_position();
        gate.settle_until = None;
        true
    }

    pub fn last_sent(&self, axis: Axis) -> Angle {
        self.axis(axis).last_sent
    }

    pub fn confirmed(&self, axis: Axis) -> Angle {
        self.axis(axis).confirmed
    }

    pub fn is_settling(&self, axis: Axis, now: Instant) -> bool {
        self.axis(axis).settling(now)
    }

    fn axis(&self, axis: Axis) -> &AxisGate {
        &self.axes[axis_index(axis)]
    }

    fn axis_mut(&mut self, axis: Axis) -> &mut AxisGate {
        &mut self.axes[axis_index(axis)]
    }
}

fn axis_index(axis: Axis) -> usize {
    match axis {
        Axis::Pan => 0,
        Axis::Tilt => 1,
    }
}
