//! Scenario tests for the centering loop.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::watch;

use pantilt_models::{Angle, Axis, Frame, FrameSize, TargetSample};

use crate::centering::{CenteringState, Transition};
use crate::config::ControlConfig;
use crate::error::{ControlError, ControlResult, LinkError, LinkKind, SinkError};
use crate::link::{ActuatorChannel, TriggerChannel};
use crate::pipeline::{FrameSource, PositionEstimator, ScreenshotSink};
use crate::runner::{ControlLoop, RunEnd};
use crate::state::ControlLoopState;

const SIZE: FrameSize = FrameSize {
    width: 800,
    height: 600,
};
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

fn centered() -> Option<TargetSample> {
    Some(TargetSample::new(400.0, 300.0))
}

/// Feed `samples` at a fixed frame interval, returning the fire count.
fn run_ticks(
    state: &mut ControlLoopState,
    start: Instant,
    samples: impl IntoIterator<Item = Option<TargetSample>>,
) -> (usize, Instant) {
    let mut fired = 0;
    let mut now = start;
    for sample in samples {
        if state.tick(SIZE, sample, now).fired() {
            fired += 1;
        }
        now += FRAME_INTERVAL;
    }
    (fired, now)
}

#[test]
fn test_steady_center_sends_no_commands() {
    let mut state = ControlLoopState::new(&ControlConfig::default());
    let t0 = Instant::now();

    for i in 0..12u32 {
        let report = state.tick(SIZE, centered(), t0 + FRAME_INTERVAL * i);
        let smoothed = report.smoothed.unwrap();
        assert_eq!(smoothed.x, 400.0);
        assert!(report.is_centered);
        assert!(report.commands.is_empty());
        if i == 0 {
            assert_eq!(report.transition, Transition::StartedDwell);
        }
    }
    assert_eq!(state.last_sent(Axis::Pan), Angle::NEUTRAL);
    assert_eq!(state.last_sent(Axis::Tilt), Angle::NEUTRAL);
}

#[test]
fn test_absent_then_centered_starts_dwell_on_first_centered_tick() {
    let mut state = ControlLoopState::new(&ControlConfig::default());
    let t0 = Instant::now();

    let (fired, now) = run_ticks(&mut state, t0, vec![None; 5]);
    assert_eq!(fired, 0);
    assert_eq!(state.centering_state(), CenteringState::Idle);

    let report = state.tick(SIZE, centered(), now);
    assert_eq!(report.transition, Transition::StartedDwell);
    assert_eq!(state.centering_state(), CenteringState::Dwelling { since: now });
}

#[test]
fn test_absent_then_centered_fires_two_seconds_after_first_centered_frame() {
    let mut state = ControlLoopState::new(&ControlConfig::default());
    let t0 = Instant::now();
    let spacing = Duration::from_millis(100);

    // Frames 1-5 absent, 6-30 centered
    let mut samples = vec![None; 5];
    samples.extend(vec![centered(); 25]);

    let first_centered = t0 + spacing * 5;
    let mut fires = Vec::new();
    for (i, sample) in samples.into_iter().enumerate() {
        let now = t0 + spacing * i as u32;
        if state.tick(SIZE, sample, now).fired() {
            fires.push(now);
        }
    }

    assert_eq!(fires.len(), 1);
    assert_eq!(fires[0] - first_centered, Duration::from_secs(2));
}

#[test]
fn test_two_second_hold_fires_once() {
    let mut state = ControlLoopState::new(&ControlConfig::default());
    // Tick 61 is the first at or past 2.0 s
    let (fired, _) = run_ticks(&mut state, Instant::now(), vec![centered(); 63]);
    assert_eq!(fired, 1);
}

#[test]
fn test_ten_second_hold_fires_once() {
    let mut state = ControlLoopState::new(&ControlConfig::default());
    let (fired, _) = run_ticks(&mut state, Instant::now(), vec![centered(); 310]);
    assert_eq!(fired, 1);
}

#[test]
fn test_short_hold_never_fires() {
    let mut state = ControlLoopState::new(&ControlConfig::default());
    let (fired, _) = run_ticks(&mut state, Instant::now(), vec![centered(); 60]);
    assert_eq!(fired, 0);
}

#[test]
fn test_one_tick_break_allows_second_trigger() {
    let mut state = ControlLoopState::new(&ControlConfig::default());
    let t0 = Instant::now();

    // Fire at ~2 s, keep holding until ~5.3 s
    let (first, now) = run_ticks(&mut state, t0, vec![centered(); 160]);
    assert_eq!(first, 1);

    let report = state.tick(SIZE, None, now);
    assert_eq!(report.transition, Transition::Reset);

    // Re-dwell fires at ~7.3 s, after the quiet guard expired at ~6 s
    let (second, _) = run_ticks(&mut state, now + FRAME_INTERVAL, vec![centered(); 70]);
    assert_eq!(second, 1);
}

#[test]
fn test_loss_resets_dwell_before_threshold() {
    let mut state = ControlLoopState::new(&ControlConfig::default());
    let t0 = Instant::now();

    let mut samples = vec![centered(); 40];
    samples.push(None);
    samples.extend(vec![centered(); 40]);
    let (fired, _) = run_ticks(&mut state, t0, samples);
    assert_eq!(fired, 0);
}

#[test]
fn test_loss_resets_fired_state() {
    let mut state = ControlLoopState::new(&ControlConfig::default());
    let (fired, now) = run_ticks(&mut state, Instant::now(), vec![centered(); 70]);
    assert_eq!(fired, 1);
    assert!(matches!(
        state.centering_state(),
        CenteringState::Fired { .. }
    ));

    state.tick(SIZE, None, now);
    assert_eq!(state.centering_state(), CenteringState::Idle);
}

#[test]
fn test_leaving_zone_resets() {
    let mut state = ControlLoopState::new(&ControlConfig::default());
    let t0 = Instant::now();
    state.tick(SIZE, centered(), t0);

    // A single far sample drags the 2-sample mean out of the zone
    let report = state.tick(SIZE, Some(TargetSample::new(0.0, 300.0)), t0 + FRAME_INTERVAL);
    assert!(!report.is_centered);
    assert_eq!(report.transition, Transition::Reset);
}

#[test]
fn test_resolution_change_moves_zone() {
    let mut state = ControlLoopState::new(&ControlConfig::default());
    let t0 = Instant::now();
    let sample = Some(TargetSample::new(400.0, 300.0));

    assert!(state.tick(SIZE, sample, t0).is_centered);
    let report = state.tick(FrameSize::new(1920, 1080), sample, t0 + FRAME_INTERVAL);
    assert!(!report.is_centered);
    assert_eq!(report.zone.x_min, 768);
}

// === Full loop ===

struct ScriptedSource {
    frames: VecDeque<Frame>,
    interval: Duration,
    endless: bool,
}

impl ScriptedSource {
    fn new(samples: Vec<Option<TargetSample>>) -> Self {
        let frames = samples
            .into_iter()
            .enumerate()
            .map(|(i, s)| Frame::new(i as u64, SIZE).with_landmark(s))
            .collect();
        Self {
            frames,
            interval: Duration::from_millis(5),
            endless: false,
        }
    }

    fn endless() -> Self {
        Self {
            endless: true,
            ..Self::new(Vec::new())
        }
    }
}

#[async_trait]
impl FrameSource for ScriptedSource {
    async fn next_frame(&mut self) -> ControlResult<Option<Frame>> {
        tokio::time::sleep(self.interval).await;
        if self.endless {
            return Ok(Some(Frame::new(0, SIZE).with_landmark(centered())));
        }
        Ok(self.frames.pop_front())
    }
}

struct FailingSource;

#[async_trait]
impl FrameSource for FailingSource {
    async fn next_frame(&mut self) -> ControlResult<Option<Frame>> {
        Err(ControlError::source_failed("camera unplugged"))
    }
}

struct LandmarkOnly;

impl PositionEstimator for LandmarkOnly {
    fn estimate(&mut self, frame: &Frame) -> Option<TargetSample> {
        frame.landmark
    }
}

#[derive(Clone, Default)]
struct WireLog(Arc<Mutex<Vec<String>>>);

impl WireLog {
    fn push(&self, line: impl Into<String>) {
        self.0.lock().unwrap().push(line.into());
    }

    fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

struct RecordingActuator(WireLog);

impl ActuatorChannel for RecordingActuator {
    fn send(&mut self, axis: Axis, angle: Angle) -> Result<(), LinkError> {
        self.0.push(format!("{}:{}", axis.wire_label(), angle));
        Ok(())
    }

    fn close(&mut self) -> Result<(), LinkError> {
        self.0.push("close actuator");
        Ok(())
    }
}

struct RecordingTrigger(WireLog);

impl TriggerChannel for RecordingTrigger {
    fn send(&mut self) -> Result<(), LinkError> {
        self.0.push("go");
        Ok(())
    }

    fn close(&mut self) -> Result<(), LinkError> {
        self.0.push("close trigger");
        Ok(())
    }
}

/// Links that record every attempt and fail all of them.
struct FailingActuator(WireLog);

impl ActuatorChannel for FailingActuator {
    fn send(&mut self, axis: Axis, angle: Angle) -> Result<(), LinkError> {
        self.0.push(format!("{}:{}", axis.wire_label(), angle));
        Err(LinkError::transient(LinkKind::Actuator, "write timed out"))
    }

    fn close(&mut self) -> Result<(), LinkError> {
        self.0.push("close actuator");
        Ok(())
    }
}

struct FailingTrigger(WireLog);

impl TriggerChannel for FailingTrigger {
    fn send(&mut self) -> Result<(), LinkError> {
        self.0.push("go");
        Err(LinkError::transient(LinkKind::Trigger, "write timed out"))
    }

    fn close(&mut self) -> Result<(), LinkError> {
        self.0.push("close trigger");
        Ok(())
    }
}

/// Estimator that takes a while and remembers which frames it saw.
struct SlowEstimator {
    delay: Duration,
    seen: Arc<Mutex<Vec<u64>>>,
    calls: Arc<AtomicUsize>,
}

impl PositionEstimator for SlowEstimator {
    fn estimate(&mut self, frame: &Frame) -> Option<TargetSample> {
        std::thread::sleep(self.delay);
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(frame.index);
        frame.landmark
    }
}

#[derive(Default)]
struct MemorySink(Mutex<Vec<String>>);

#[async_trait]
impl ScreenshotSink for MemorySink {
    async fn persist(&self, _frame: Arc<Frame>, file_name: String) -> Result<PathBuf, SinkError> {
        self.0.lock().unwrap().push(file_name.clone());
        Ok(PathBuf::from(file_name))
    }
}

fn fast_config() -> ControlConfig {
    ControlConfig {
        dwell_threshold_secs: 0.05,
        ..Default::default()
    }
}

fn build(
    config: ControlConfig,
    source: impl FrameSource + 'static,
    log: &WireLog,
    sink: Arc<MemorySink>,
) -> ControlLoop {
    ControlLoop::new(
        config,
        Box::new(source),
        Box::new(LandmarkOnly),
        sink,
        Box::new(RecordingActuator(log.clone())),
        Box::new(RecordingTrigger(log.clone())),
    )
    .unwrap()
}

#[tokio::test]
async fn test_loop_fires_once_and_closes_links() {
    let log = WireLog::default();
    let sink = Arc::new(MemorySink::default());
    let source = ScriptedSource::new(vec![centered(); 40]);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let summary = build(fast_config(), source, &log, Arc::clone(&sink))
        .run(shutdown_rx)
        .await
        .unwrap();

    assert_eq!(summary.end, Some(RunEnd::SourceExhausted));
    assert_eq!(summary.triggers_fired, 1);
    assert_eq!(summary.commands_sent, 0);
    assert_eq!(summary.screenshots_saved, 1);
    assert!(summary.frames_processed > 0);
    assert_eq!(log.lines(), vec!["go", "close actuator", "close trigger"]);

    let names = sink.0.lock().unwrap().clone();
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("face_centered_"));
    assert!(names[0].ends_with(".jpg"));
}

#[tokio::test]
async fn test_loop_moves_toward_target() {
    let log = WireLog::default();
    let sink = Arc::new(MemorySink::default());
    let source = ScriptedSource::new(vec![Some(TargetSample::new(0.0, 300.0)); 10]);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let summary = build(fast_config(), source, &log, Arc::clone(&sink))
        .run(shutdown_rx)
        .await
        .unwrap();

    assert_eq!(summary.commands_sent, 1);
    assert_eq!(summary.triggers_fired, 0);
    assert_eq!(log.lines(), vec!["X:0", "close actuator", "close trigger"]);
}

#[tokio::test]
async fn test_loop_stops_on_shutdown() {
    let log = WireLog::default();
    let sink = Arc::new(MemorySink::default());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(
        build(fast_config(), ScriptedSource::endless(), &log, sink).run(shutdown_rx),
    );
    tokio::time::sleep(Duration::from_millis(30)).await;
    shutdown_tx.send(true).unwrap();

    let summary = handle.await.unwrap().unwrap();
    assert_eq!(summary.end, Some(RunEnd::Cancelled));
    let lines = log.lines();
    assert_eq!(
        &lines[lines.len() - 2..],
        &["close actuator".to_string(), "close trigger".to_string()]
    );
}

#[tokio::test]
async fn test_loop_surfaces_source_failure() {
    let log = WireLog::default();
    let sink = Arc::new(MemorySink::default());
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let result = build(fast_config(), FailingSource, &log, sink)
        .run(shutdown_rx)
        .await;

    assert!(matches!(result, Err(ControlError::Source(_))));
    assert_eq!(log.lines(), vec!["close actuator", "close trigger"]);
}

#[tokio::test]
async fn test_loop_keeps_running_when_links_fail() {
    let log = WireLog::default();
    let sink = Arc::new(MemorySink::default());
    let mut samples = vec![Some(TargetSample::new(0.0, 300.0)); 8];
    samples.extend(vec![centered(); 40]);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let summary = ControlLoop::new(
        fast_config(),
        Box::new(ScriptedSource::new(samples)),
        Box::new(LandmarkOnly),
        sink,
        Box::new(FailingActuator(log.clone())),
        Box::new(FailingTrigger(log.clone())),
    )
    .unwrap()
    .run(shutdown_rx)
    .await
    .unwrap();

    assert_eq!(summary.end, Some(RunEnd::SourceExhausted));
    assert!(summary.frames_processed > 8);

    // Each failure rolls pan back to neutral, so the next tick retries
    let lines = log.lines();
    let pan_attempts = lines.iter().filter(|l| l.as_str() == "X:0").count();
    assert!(pan_attempts >= 2, "{lines:?}");
    assert!(summary.commands_failed >= 2);

    // The dwell still completes and fires exactly once
    assert_eq!(summary.triggers_fired, 1);
    assert_eq!(summary.triggers_failed, 1);
    assert_eq!(summary.screenshots_saved, 1);
    assert_eq!(&lines[lines.len() - 2..], &["close actuator", "close trigger"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_slow_tick_drops_stale_frames() {
    let log = WireLog::default();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let calls = Arc::new(AtomicUsize::new(0));
    let mut source = ScriptedSource::new(vec![centered(); 40]);
    source.interval = Duration::from_millis(2);
    let estimator = SlowEstimator {
        delay: Duration::from_millis(15),
        seen: Arc::clone(&seen),
        calls: Arc::clone(&calls),
    };
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let summary = ControlLoop::new(
        ControlConfig::default(),
        Box::new(source),
        Box::new(estimator),
        Arc::new(MemorySink::default()),
        Box::new(RecordingActuator(log.clone())),
        Box::new(RecordingTrigger(log)),
    )
    .unwrap()
    .run(shutdown_rx)
    .await
    .unwrap();

    assert!(summary.frames_dropped > 0);
    assert_eq!(summary.frames_processed + summary.frames_dropped, 40);
    assert_eq!(summary.frames_processed as usize, calls.load(Ordering::SeqCst));

    let seen = seen.lock().unwrap().clone();
    assert!(seen.windows(2).all(|w| w[0] < w[1]), "{seen:?}");
    assert_eq!(seen.last(), Some(&39));
}

#[test]
fn test_invalid_config_is_rejected_before_start() {
    let log = WireLog::default();
    let config = ControlConfig {
        small_deadzone: 9,
        large_deadzone: 3,
        ..Default::default()
    };
    let result = ControlLoop::new(
        config,
        Box::new(ScriptedSource::new(Vec::new())),
        Box::new(LandmarkOnly),
        Arc::new(MemorySink::default()),
        Box::new(RecordingActuator(log.clone())),
        Box::new(RecordingTrigger(log)),
    );
    assert!(matches!(result, Err(ControlError::Configuration(_))));
}
