//! Control loop orchestration.
//!
//! Acquisition runs as its own task and publishes into a depth-one watch
//! channel, so the tick always works on the latest frame and stale frames
//! are dropped instead of queued. The tick owns [`ControlLoopState`] and
//! hands link I/O to the [`LinkDispatcher`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use pantilt_models::Frame;

use crate::config::ControlConfig;
use crate::dispatch::{LinkDispatcher, LinkReport};
use crate::error::{ControlError, ControlResult, SinkError};
use crate::link::{ActuatorChannel, TriggerChannel};
use crate::metrics;
use crate::pipeline::{DisplaySink, FrameSource, PositionEstimator, ScreenshotSink};
use crate::state::ControlLoopState;

/// Frame published by acquisition, tagged with its publish sequence.
type Published = Option<(u64, Arc<Frame>)>;

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunEnd {
    Cancelled,
    SourceExhausted,
}

/// Counters for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub frames_processed: u64,
    pub frames_dropped: u64,
    pub commands_sent: u64,
    pub commands_failed: u64,
    pub triggers_fired: u64,
    pub triggers_failed: u64,
    pub screenshots_saved: u64,
    pub screenshots_failed: u64,
    pub end: Option<RunEnd>,
}

impl RunSummary {
    fn record_report(&mut self, report: &LinkReport) {
        match report {
            LinkReport::Actuated { .. } | LinkReport::Triggered { .. } => {}
            LinkReport::ActuateFailed {
                axis, angle, error, ..
            } => {
                warn!(%axis, %angle, error = %error, "Actuator command failed");
                metrics::record_link_failure(error.link());
                self.commands_failed += 1;
            }
            LinkReport::TriggerFailed { seq, error } => {
                warn!(seq, error = %error, "Trigger failed");
                metrics::record_link_failure(error.link());
                self.triggers_failed += 1;
            }
        }
    }
}

/// File name for the frame saved when the trigger fires.
pub fn screenshot_file_name(at: DateTime<Local>) -> String {
    format!("face_centered_{}.jpg", at.format("%Y%m%d_%H%M%S"))
}

/// The closed loop: source → estimator → state → links.
pub struct ControlLoop {
    config: ControlConfig,
    source: Box<dyn FrameSource>,
    estimator: Box<dyn PositionEstimator>,
    screenshots: Arc<dyn ScreenshotSink>,
    display: Option<Box<dyn DisplaySink>>,
    actuator: Box<dyn ActuatorChannel>,
    trigger: Box<dyn TriggerChannel>,
}

impl ControlLoop {
    /// Build a loop, rejecting invalid configuration before anything runs.
    pub fn new(
        config: ControlConfig,
        source: Box<dyn FrameSource>,
        estimator: Box<dyn PositionEstimator>,
        screenshots: Arc<dyn ScreenshotSink>,
        actuator: Box<dyn ActuatorChannel>,
        trigger: Box<dyn TriggerChannel>,
    ) -> ControlResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            source,
            estimator,
            screenshots,
            display: None,
            actuator,
            trigger,
        })
    }

    pub fn with_display(mut self, display: Box<dyn DisplaySink>) -> Self {
        self.display = Some(display);
        self
    }

    /// Run until the source is exhausted or `shutdown` turns true.
    ///
    /// Both links are closed before this returns. A failing source ends the
    /// run with [`ControlError::Source`] after the links are released.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> ControlResult<RunSummary> {
        let ControlLoop {
            config,
            source,
            mut estimator,
            screenshots,
            mut display,
            actuator,
            trigger,
        } = self;

        let mut dispatcher = LinkDispatcher::spawn(actuator, trigger, config.link_queue_depth);
        let mut state = ControlLoopState::new(&config);
        let mut summary = RunSummary::default();
        let mut persists = JoinSet::new();

        let (frame_tx, mut frame_rx) = watch::channel::<Published>(None);
        let acquisition = tokio::spawn(acquire(source, frame_tx, shutdown.clone()));

        info!(config = ?config, "Control loop started");

        let mut last_seq = 0u64;
        let mut shutdown_open = true;
        let mut cancelled = *shutdown.borrow();

        while !cancelled {
            tokio::select! {
                changed = shutdown.changed(), if shutdown_open => {
                    match changed {
                        Ok(()) => cancelled = *shutdown.borrow(),
                        Err(_) => shutdown_open = false,
                    }
                }
                changed = frame_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let Some((seq, frame)) = frame_rx.borrow_and_update().clone() else {
                        continue;
                    };

                    let dropped = seq.saturating_sub(last_seq + 1);
                    last_seq = seq;
                    if dropped > 0 {
                        debug!(dropped, "Frames overwritten before processing");
                        summary.frames_dropped += dropped;
                        metrics::record_frames_dropped(dropped);
                    }

                    while let Some(report) = dispatcher.try_recv_report() {
                        state.apply_report(&report);
                        summary.record_report(&report);
                    }

                    let started = Instant::now();
                    let sample = estimator.estimate(&frame);
                    if sample.is_none() {
                        metrics::record_target_miss();
                    }
                    let report = state.tick(frame.size, sample, started);

                    for axis in &report.suppressed {
                        metrics::record_command_suppressed(*axis);
                    }
                    for command in &report.commands {
                        match dispatcher.try_actuate(command.axis, command.angle, command.seq) {
                            Ok(()) => {
                                metrics::record_command(command.axis, command.decision);
                                summary.commands_sent += 1;
                            }
                            Err(e) => {
                                warn!(axis = %command.axis, angle = %command.angle, error = %e, "Dropping actuator command");
                                metrics::record_link_failure(e.link());
                                state.reject_command(command);
                                summary.commands_failed += 1;
                            }
                        }
                    }

                    if let Some(trigger_seq) = report.trigger_seq {
                        summary.triggers_fired += 1;
                        metrics::record_trigger_fired();

                        let file_name =
                            screenshot_file_name(frame.captured_at.with_timezone(&Local));
                        let sink = Arc::clone(&screenshots);
                        let shot = Arc::clone(&frame);
                        persists.spawn(async move { sink.persist(shot, file_name).await });

                        if let Err(e) = dispatcher.try_trigger(trigger_seq) {
                            warn!(seq = trigger_seq, error = %e, "Dropping trigger");
                            metrics::record_link_failure(e.link());
                            state.reject_trigger(trigger_seq);
                            summary.triggers_failed += 1;
                        }
                    }

                    while let Some(joined) = persists.try_join_next() {
                        record_persist(joined, &mut summary);
                    }

                    if let Some(display) = display.as_mut() {
                        display.show(&frame, &state.overlay(&report));
                    }

                    metrics::set_dwell_seconds(report.dwell.map_or(0.0, |d| d.as_secs_f64()));
                    metrics::record_tick(started.elapsed().as_secs_f64());
                    summary.frames_processed += 1;
                }
            }
        }

        let end = match acquisition.await {
            Ok(Ok(())) if cancelled => RunEnd::Cancelled,
            Ok(Ok(())) => RunEnd::SourceExhausted,
            Ok(Err(e)) => {
                error!(error = %e, "Frame source failed");
                finish(dispatcher, &mut persists, &mut summary).await;
                return Err(e);
            }
            Err(e) => {
                error!(error = %e, "Acquisition task failed");
                finish(dispatcher, &mut persists, &mut summary).await;
                return Err(ControlError::source_failed(e.to_string()));
            }
        };

        finish(dispatcher, &mut persists, &mut summary).await;
        summary.end = Some(end);

        info!(
            frames_processed = summary.frames_processed,
            frames_dropped = summary.frames_dropped,
            commands_sent = summary.commands_sent,
            triggers_fired = summary.triggers_fired,
            screenshots_saved = summary.screenshots_saved,
            end = ?end,
            "Control loop stopped"
        );

        Ok(summary)
    }
}

/// Pull frames until the source ends or shutdown is requested.
async fn acquire(
    mut source: Box<dyn FrameSource>,
    frames: watch::Sender<Published>,
    mut shutdown: watch::Receiver<bool>,
) -> ControlResult<()> {
    let mut seq = 0u64;
    let mut shutdown_open = true;

    loop {
        if *shutdown.borrow() {
            return Ok(());
        }

        tokio::select! {
            changed = shutdown.changed(), if shutdown_open => {
                if changed.is_err() {
                    shutdown_open = false;
                }
            }
            next = source.next_frame() => {
                match next? {
                    Some(frame) => {
                        seq += 1;
                        frames.send_replace(Some((seq, Arc::new(frame))));
                    }
                    None => {
                        info!(frames = seq, "Frame source exhausted");
                        return Ok(());
                    }
                }
            }
        }
    }
}

async fn finish(
    dispatcher: LinkDispatcher,
    persists: &mut JoinSet<Result<PathBuf, SinkError>>,
    summary: &mut RunSummary,
) {
    for report in dispatcher.shutdown().await {
        summary.record_report(&report);
    }
    while let Some(joined) = persists.join_next().await {
        record_persist(joined, summary);
    }
}

fn record_persist(
    joined: Result<Result<PathBuf, SinkError>, JoinError>,
    summary: &mut RunSummary,
) {
    match joined {
        Ok(Ok(path)) => {
            info!(path = %path.display(), "Screenshot saved");
            metrics::record_screenshot(true);
            summary.screenshots_saved += 1;
        }
        Ok(Err(e)) => {
            warn!(error = %e, "Failed to save screenshot");
            metrics::record_screenshot(false);
            summary.screenshots_failed += 1;
        }
        Err(e) => {
            warn!(error = %e, "Screenshot task failed");
            metrics::record_screenshot(false);
            summary.screenshots_failed += 1;
        }
    }
}
