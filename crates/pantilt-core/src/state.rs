//! Per-session control state threaded through each tick.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use pantilt_models::{
    Angle, Axis, FrameSize, MotionDecision, SmoothedPosition, TargetSample, Zone,
};

use crate::centering::{CenteringState, CenteringStateMachine, Transition};
use crate::config::ControlConfig;
use crate::dispatch::LinkReport;
use crate::gate::{GateOutcome, MotionGate};
use crate::mapping::map_to_angle;
use crate::pipeline::Overlay;
use crate::smoothing::SmoothingFilter;

/// Actuator command produced by a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisCommand {
    pub axis: Axis,
    pub angle: Angle,
    pub decision: MotionDecision,
    pub seq: u64,
}

/// Everything one tick decided.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub zone: Zone,
    pub target_present: bool,
    pub smoothed: Option<SmoothedPosition>,
    pub is_centered: bool,
    /// Commands to enqueue on the actuator link, pan first
    pub commands: Vec<AxisCommand>,
    /// Axes whose command was held back by the settle interval
    pub suppressed: Vec<Axis>,
    pub transition: Transition,
    pub dwell: Option<Duration>,
    /// Fire sequence number when the trigger fired this tick
    pub trigger_seq: Option<u64>,
}

impl TickReport {
    pub fn fired(&self) -> bool {
        self.trigger_seq.is_some()
    }
}

/// Filter, gate and centering state for one session.
#[derive(Debug, Clone)]
pub struct ControlLoopState {
    zone_fraction: f64,
    filter: SmoothingFilter,
    gate: MotionGate,
    centering: CenteringStateMachine,
}

impl ControlLoopState {
    pub fn new(config: &ControlConfig) -> Self {
        Self {
            zone_fraction: config.zone_fraction,
            filter: SmoothingFilter::new(config.smoothing_window),
            gate: MotionGate::from_config(config),
            centering: CenteringStateMachine::from_config(config),
        }
    }

    /// Run the control pipeline for one frame.
    pub fn tick(
        &mut self,
        size: FrameSize,
        sample: Option<TargetSample>,
        now: Instant,
    ) -> TickReport {
        if let Some(sample) = sample {
            self.filter.push(sample);
        }

        let target_present = sample.is_some();
        let smoothed = self.filter.value();
        let zone = Zone::centered(size, self.zone_fraction);
        let is_centered = target_present && smoothed.is_some_and(|p| zone.contains(p));

        let mut commands = Vec::new();
        let mut suppressed = Vec::new();

        match (target_present, smoothed) {
            (true, Some(position)) => {
                debug!(x = position.x, y = position.y, "Target");
                for axis in Axis::ALL {
                    let angle = map_to_angle(position.coordinate(axis), size.dimension(axis));
                    match self.gate.evaluate(axis, angle, now) {
                        GateOutcome::Hold => {}
                        GateOutcome::Suppressed { .. } => suppressed.push(axis),
                        GateOutcome::Send {
                            decision,
                            angle,
                            seq,
                        } => {
                            info!(%axis, %angle, "{}", decision.as_str().to_uppercase());
                            commands.push(AxisCommand {
                                axis,
                                angle,
                                decision,
                                seq,
                            });
                        }
                    }
                }
            }
            _ => debug!("No target detected"),
        }

        let transition = self.centering.update(target_present, is_centered, now);
        match transition {
            Transition::StartedDwell => info!(zone = %zone.label(), "Centered, starting dwell timer"),
            Transition::Reset => debug!("Left centered zone"),
            Transition::Fired => info!("Dwell threshold reached, firing trigger"),
            Transition::Unchanged => {}
        }

        TickReport {
            zone,
            target_present,
            smoothed,
            is_centered,
            commands,
            suppressed,
            transition,
            dwell: self.centering.dwell_elapsed(now),
            trigger_seq: match transition {
                Transition::Fired => self.centering.last_fire(),
                _ => None,
            },
        }
    }

    /// Fold a link outcome back into the state.
    pub fn apply_report(&mut self, report: &LinkReport) {
        match report {
            LinkReport::Actuated { axis, angle, seq } => self.gate.confirm(*axis, *seq, *angle),
            LinkReport::ActuateFailed { axis, seq, .. } => {
                self.gate.rollback(*axis, *seq);
            }
            LinkReport::Triggered { seq } => self.centering.trigger_confirmed(*seq),
            LinkReport::TriggerFailed { seq, .. } => self.centering.trigger_failed(*seq),
        }
    }

    /// Roll back a command that never reached the link worker.
    pub fn reject_command(&mut self, command: &AxisCommand) {
        self.gate.rollback(command.axis, command.seq);
    }

    /// Record a trigger that never reached the link worker.
    pub fn reject_trigger(&mut self, seq: u64) {
        self.centering.trigger_failed(seq);
    }

    /// Overlay for the most recent tick.
    pub fn overlay(&self, report: &TickReport) -> Overlay {
        Overlay {
            zone: report.zone,
            smoothed: report.smoothed,
            dwell: report.dwell,
            fired: self.centering.has_fired(),
        }
    }

    pub fn centering_state(&self) -> CenteringState {
        self.centering.state()
    }

    pub fn last_sent(&self, axis: Axis) -> Angle {
        self.gate.last_sent(axis)
    }
}
