//! Dwell timer and one-shot trigger.
//!
//! The target has to stay inside the centered zone for the dwell threshold
//! before the trigger fires. It fires once per unbroken dwell; leaving the
//! zone or losing the target resets to `Idle`. After a fire a quiet guard
//! blocks the next fire until it expires, even across resets.

use std::time::{Duration, Instant};

use crate::config::ControlConfig;

/// Delivery status of the trigger fired for the current dwell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerStatus {
    /// Enqueued, no report yet.
    Pending,
    /// Written to the trigger link.
    Confirmed,
    /// The link reported a failure.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CenteringState {
    Idle,
    Dwelling {
        since: Instant,
    },
    Fired {
        since: Instant,
        fired_at: Instant,
        /// Identifies this fire in trigger link reports.
        seq: u64,
        trigger: TriggerStatus,
    },
}

/// What changed in one update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    /// Left `Dwelling` or `Fired` for `Idle`.
    Reset,
    StartedDwell,
    /// Fired this tick. The caller persists the frame and sends the trigger.
    Fired,
}

#[derive(Debug, Clone)]
pub struct CenteringStateMachine {
    dwell_threshold: Duration,
    post_trigger_quiet: Duration,
    state: CenteringState,
    quiet_until: Option<Instant>,
    /// Sequence number of the most recent fire.
    fire_seq: u64,
}

impl CenteringStateMachine {
    pub fn new(dwell_threshold: Duration, post_trigger_quiet: Duration) -> Self {
        Self {
            dwell_threshold,
            post_trigger_quiet,
            state: CenteringState::Idle,
            quiet_until: None,
            fire_seq: 0,
        }
    }

    pub fn from_config(config: &ControlConfig) -> Self {
        Self::new(config.dwell_threshold(), config.post_trigger_quiet())
    }

    /// Advance the machine for one tick.
    pub fn update(&mut self, target_present: bool, is_centered: bool, now: Instant) -> Transition {
        if !(target_present && is_centered) {
            return match self.state {
                CenteringState::Idle => Transition::Unchanged,
                _ => {
                    self.state = CenteringState::Idle;
                    Transition::Reset
                }
            };
        }

        match self.state {
            CenteringState::Idle => {
                self.state = CenteringState::Dwelling { since: now };
                Transition::StartedDwell
            }
            CenteringState::Dwelling { since } => {
                if now.saturating_duration_since(since) < self.dwell_threshold
                    || self.in_quiet_period(now)
                {
                    return Transition::Unchanged;
                }
                self.fire_seq += 1;
                self.state = CenteringState::Fired {
                    since,
                    fired_at: now,
                    seq: self.fire_seq,
                    trigger: TriggerStatus::Pending,
                };
                self.quiet_until = Some(now + self.post_trigger_quiet);
                Transition::Fired
            }
            CenteringState::Fired { .. } => Transition::Unchanged,
        }
    }

    /// Time spent centered in the current dwell, if any.
    pub fn dwell_elapsed(&self, now: Instant) -> Option<Duration> {
        match self.state {
            CenteringState::Idle => None,
            CenteringState::Dwelling { since } | CenteringState::Fired { since, .. } => {
                Some(now.saturating_duration_since(since))
            }
        }
    }

    /// Sequence number of the most recent fire, if any.
    pub fn last_fire(&self) -> Option<u64> {
        (self.fire_seq > 0).then_some(self.fire_seq)
    }

    /// Mark the trigger of fire `seq` as written.
    pub fn trigger_confirmed(&mut self, seq: u64) {
        self.set_trigger_status(seq, TriggerStatus::Confirmed);
    }

    /// Mark the trigger of fire `seq` as failed and drop its quiet guard.
    ///
    /// Reports for an older fire are ignored so they cannot lift the guard
    /// of a newer one.
    pub fn trigger_failed(&mut self, seq: u64) {
        if seq != self.fire_seq {
            return;
        }
        self.set_trigger_status(seq, TriggerStatus::Failed);
        self.quiet_until = None;
    }

    pub fn in_quiet_period(&self, now: Instant) -> bool {
        self.quiet_until.is_some_and(|until| now < until)
    }

    pub fn state(&self) -> CenteringState {
        self.state
    }

    pub fn has_fired(&self) -> bool {
        matches!(self.state, CenteringState::Fired { .. })
    }

    fn set_trigger_status(&mut self, seq: u64, status: TriggerStatus) {
        if let CenteringState::Fired {
            seq: current,
            trigger,
            ..
        } = &mut self.state
        {
            if *current == seq {
                *trigger = status;
            }
        }
    }
}
