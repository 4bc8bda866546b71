//! Progress relay: transport byte counts → ProgressStore, events, keep-alive.

use std::sync::Arc;

use super::Shared;
use crate::events::{Connectivity, UploadEvent};
use crate::job::UploadJob;
use crate::progress::{JobProgress, ProgressThrottle};

/// Per-attempt relay. Runs on the blocking thread that drives the transport.
pub(super) struct ProgressRelay {
    shared: Arc<Shared>,
    job: Arc<UploadJob>,
    generation: u64,
    total: u64,
    throttle: ProgressThrottle,
}

impl ProgressRelay {
    pub(super) fn new(shared: Arc<Shared>, job: Arc<UploadJob>, generation: u64, total: u64) -> Self {
        let throttle = ProgressThrottle::new(shared.config.progress_interval());
        Self {
            shared,
            job,
            generation,
            total,
            throttle,
        }
    }

    fn record(&self, sent: u64, progress: f64) -> bool {
        let shared = &self.shared;
        shared
            .table
            .with_current(&self.job.id, self.generation, || {
                shared.progress.set(&self.job.id, sent, self.total);
                shared.sink.emit(UploadEvent::Progress {
                    id: self.job.id.clone(),
                    progress,
                });
            })
            .is_some()
    }

    /// Mandatory 0% update at the start of every attempt, recorded before the
    /// job competes for a slot so the aggregate already accounts for its size.
    pub(super) fn start(&self) {
        self.record(0, 0.0);
    }

    /// Throttled update from the transport.
    pub(super) fn on_bytes(&mut self, sent: u64) {
        if !self.throttle.ready() {
            return;
        }
        let progress = JobProgress { sent, total: self.total }.percent();
        if self.record(sent, progress) {
            self.shared.declare(&self.job, Connectivity::Ok);
        }
    }

    /// Mandatory 100% update, emitted before the success event.
    pub(super) fn complete(&self) {
        self.record(self.total, 100.0);
    }
}
