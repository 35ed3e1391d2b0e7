//! Link worker.
//!
//! Link writes are blocking, so they run on a dedicated blocking task fed by
//! a bounded queue. The control tick only ever enqueues with `try_send` and
//! reads outcomes back from an unbounded report channel, so a slow or
//! wedged link never stalls frame processing.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use pantilt_models::{Angle, Axis};

use crate::error::{LinkError, LinkKind};
use crate::link::{ActuatorChannel, TriggerChannel};

/// Work item for the link worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRequest {
    Actuate { axis: Axis, angle: Angle, seq: u64 },
    Trigger { seq: u64 },
}

/// Outcome of one request, reported back to the tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkReport {
    Actuated {
        axis: Axis,
        angle: Angle,
        seq: u64,
    },
    ActuateFailed {
        axis: Axis,
        angle: Angle,
        seq: u64,
        error: LinkError,
    },
    Triggered {
        seq: u64,
    },
    TriggerFailed {
        seq: u64,
        error: LinkError,
    },
}

/// Owns both link handles for their whole lifetime.
///
/// Links are closed exactly once, either explicitly when the worker drains
/// its queue or from `Drop` if the worker unwinds.
struct Links {
    actuator: Box<dyn ActuatorChannel>,
    trigger: Box<dyn TriggerChannel>,
    closed: bool,
}

impl Links {
    fn handle(&mut self, request: LinkRequest) -> LinkReport {
        match request {
            LinkRequest::Actuate { axis, angle, seq } => match self.actuator.send(axis, angle) {
                Ok(()) => LinkReport::Actuated { axis, angle, seq },
                Err(error) => LinkReport::ActuateFailed {
                    axis,
                    angle,
                    seq,
                    error,
                },
            },
            LinkRequest::Trigger { seq } => match self.trigger.send() {
                Ok(()) => LinkReport::Triggered { seq },
                Err(error) => LinkReport::TriggerFailed { seq, error },
            },
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.actuator.close() {
            warn!(error = %e, "Failed to close actuator link");
        }
        if let Err(e) = self.trigger.close() {
            warn!(error = %e, "Failed to close trigger link");
        }
        debug!("Links closed");
    }
}

impl Drop for Links {
    fn drop(&mut self) {
        self.close();
    }
}

/// Handle the control tick uses to reach the link worker.
pub struct LinkDispatcher {
    requests: Option<mpsc::Sender<LinkRequest>>,
    reports: mpsc::UnboundedReceiver<LinkReport>,
    worker: Option<JoinHandle<()>>,
}

impl LinkDispatcher {
    /// Start the worker. Must be called from within a Tokio runtime.
    pub fn spawn(
        actuator: Box<dyn ActuatorChannel>,
        trigger: Box<dyn TriggerChannel>,
        queue_depth: usize,
    ) -> Self {
        let (request_tx, request_rx) = mpsc::channel(queue_depth.max(1));
        let (report_tx, report_rx) = mpsc::unbounded_channel();
        let links = Links {
            actuator,
            trigger,
            closed: false,
        };

        let worker = tokio::task::spawn_blocking(move || run_worker(links, request_rx, report_tx));

        Self {
            requests: Some(request_tx),
            reports: report_rx,
            worker: Some(worker),
        }
    }

    /// Queue an actuator command without waiting.
    pub fn try_actuate(&self, axis: Axis, angle: Angle, seq: u64) -> Result<(), LinkError> {
        self.try_enqueue(LinkKind::Actuator, LinkRequest::Actuate { axis, angle, seq })
    }

    /// Queue the trigger token for fire `seq` without waiting.
    pub fn try_trigger(&self, seq: u64) -> Result<(), LinkError> {
        self.try_enqueue(LinkKind::Trigger, LinkRequest::Trigger { seq })
    }

    /// Next pending report, if any.
    pub fn try_recv_report(&mut self) -> Option<LinkReport> {
        self.reports.try_recv().ok()
    }

    /// Stop accepting requests, let the worker finish the queue and close
    /// both links. Returns the reports that were still pending.
    pub async fn shutdown(mut self) -> Vec<LinkReport> {
        self.requests.take();

        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                warn!(error = %e, "Link worker terminated abnormally");
            }
        }

        let mut pending = Vec::new();
        while let Ok(report) = self.reports.try_recv() {
            pending.push(report);
        }
        pending
    }

    fn try_enqueue(&self, link: LinkKind, request: LinkRequest) -> Result<(), LinkError> {
        let Some(requests) = &self.requests else {
            return Err(LinkError::Closed(link));
        };
        requests.try_send(request).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => LinkError::transient(link, "link queue is full"),
            mpsc::error::TrySendError::Closed(_) => LinkError::Closed(link),
        })
    }
}

fn run_worker(
    mut links: Links,
    mut requests: mpsc::Receiver<LinkRequest>,
    reports: mpsc::UnboundedSender<LinkReport>,
) {
    while let Some(request) = requests.blocking_recv() {
        let report = links.handle(request);
        if reports.send(report).is_err() {
            debug!("Report receiver dropped, stopping link worker");
            break;
        }
    }
    links.close();
}
