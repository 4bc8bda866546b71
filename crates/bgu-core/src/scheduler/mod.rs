//! The upload orchestrator.
//!
//! One [`Uploader`] owns the live job table, the global transfer-slot
//! semaphore and the [`ProgressStore`]. Each started job gets a worker task
//! that walks it through `Deferred → Queued → Transferring` and on to a
//! terminal state, reacting to cancellation and to changes of the best
//! network for its class.

mod relay;
mod sweep;
mod table;
mod worker;

use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::config::UploaderConfig;
use crate::events::{Connectivity, EventSink, KeepAlive, NoopKeepAlive, Notice, NullSink, UploadEvent};
use crate::job::{JobSpec, JobState, JobStatus, UploadJob, ValidationError};
use crate::network::{NetworkClass, NetworkResolver};
use crate::progress::{JobProgress, ProgressStore};
use crate::retry::RetryPolicy;
use crate::transport::Transport;

use self::table::{CancelOutcome, JobEntry, JobTable};

/// State shared by the public handle and every worker.
pub(crate) struct Shared {
    config: UploaderConfig,
    policy: RetryPolicy,
    transport: Arc<dyn Transport>,
    resolver: Arc<NetworkResolver>,
    sink: Arc<dyn EventSink>,
    keep_alive: Arc<dyn KeepAlive>,
    table: JobTable,
    progress: ProgressStore,
    slots: Arc<Semaphore>,
}

impl Shared {
    fn connectivity(&self, class: NetworkClass) -> Connectivity {
        if self.resolver.current(class).is_some() {
            return Connectivity::Ok;
        }
        if class != NetworkClass::Default && self.resolver.current(NetworkClass::Default).is_some() {
            return Connectivity::NoPreferredNetwork;
        }
        Connectivity::NoInternet
    }

    fn declare(&self, job: &UploadJob, connectivity: Connectivity) {
        let notice = Notice {
            notification_id: job.notification.id.clone(),
            channel: job.notification.channel.clone(),
            title: job.notification.title_for(connectivity).to_string(),
            progress: self.progress.total(),
            connectivity,
        };
        self.keep_alive.declare(&notice);
    }

    /// Emit `event` as the job's terminal event if this generation still owns
    /// the entry. Progress is dropped right away unless the job succeeded; the
    /// sweep clears the rest once nothing is live.
    fn finish(self: &Arc<Self>, id: &str, generation: u64, event: UploadEvent) -> bool {
        let keep_progress = matches!(event, UploadEvent::Completed { .. });
        let removed = self.table.remove_current(id, generation, |_| {
            if !keep_progress {
                self.progress.remove(id);
            }
            self.sink.emit(event);
        });
        if removed {
            sweep::schedule(self);
        }
        removed
    }

    fn cancel(self: &Arc<Self>, id: &str) -> bool {
        let outcome = self.table.cancel(id, |entry: &JobEntry| {
            self.progress.remove(id);
            self.sink.emit(UploadEvent::Cancelled {
                id: entry.job.id.clone(),
            });
        });
        match outcome {
            CancelOutcome::NotFound => false,
            CancelOutcome::Removed => {
                tracing::info!(job_id = %id, "upload cancelled");
                sweep::schedule(self);
                true
            }
            CancelOutcome::Signalled => {
                tracing::debug!(job_id = %id, "aborting in-flight transfer");
                true
            }
        }
    }
}

/// Builder for [`Uploader`]. The sink and keep-alive default to no-ops.
pub struct UploaderBuilder {
    config: UploaderConfig,
    transport: Arc<dyn Transport>,
    resolver: Arc<NetworkResolver>,
    sink: Arc<dyn EventSink>,
    keep_alive: Arc<dyn KeepAlive>,
}

impl UploaderBuilder {
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn keep_alive(mut self, keep_alive: Arc<dyn KeepAlive>) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn build(self) -> Uploader {
        let slots = Arc::new(Semaphore::new(self.config.max_concurrent_transfers()));
        Uploader {
            shared: Arc::new(Shared {
                policy: RetryPolicy::from_config(&self.config),
                config: self.config,
                transport: self.transport,
                resolver: self.resolver,
                sink: self.sink,
                keep_alive: self.keep_alive,
                table: JobTable::new(),
                progress: ProgressStore::new(),
                slots,
            }),
        }
    }
}

/// Handle to the orchestrator. Cheap to clone. Starting and cancelling jobs
/// must happen inside a tokio runtime.
#[derive(Clone)]
pub struct Uploader {
    shared: Arc<Shared>,
}

impl Uploader {
    pub fn builder(
        config: UploaderConfig,
        transport: Arc<dyn Transport>,
        resolver: Arc<NetworkResolver>,
    ) -> UploaderBuilder {
        UploaderBuilder {
            config,
            transport,
            resolver,
            sink: Arc::new(NullSink),
            keep_alive: Arc::new(NoopKeepAlive),
        }
    }

    pub fn config(&self) -> &UploaderConfig {
        &self.shared.config
    }

    /// Validate `spec` and start it. Nothing is created if validation fails.
    pub fn start(&self, spec: JobSpec) -> Result<String, ValidationError> {
        let job = spec.validate(self.shared.config.default_max_retries)?;
        Ok(self.start_job(job))
    }

    /// Start an already validated job. A live job with the same id is replaced
    /// without a `cancelled` event.
    pub fn start_job(&self, job: UploadJob) -> String {
        let shared = &self.shared;
        let job = Arc::new(job);
        let initial = if shared.resolver.current(job.network_class).is_some() {
            JobState::Queued
        } else {
            JobState::Deferred
        };
        let (generation, cancel, replaced) = shared.table.insert(Arc::clone(&job), initial);
        if let Some(old) = replaced {
            tracing::info!(job_id = %job.id, "replacing live upload with the same id");
            old.cancel();
        }
        tracing::info!(job_id = %job.id, url = %job.url, class = ?job.network_class, "upload started");
        tokio::spawn(worker::run(Arc::clone(shared), Arc::clone(&job), generation, cancel));
        job.id.clone()
    }

    /// Cancel one job. Returns false if no live job has that id.
    pub fn cancel(&self, id: &str) -> bool {
        self.shared.cancel(id)
    }

    /// Cancel every live job; each reaches `Cancelled` on its own.
    pub fn cancel_all(&self) -> bool {
        for id in self.shared.table.ids() {
            self.shared.cancel(&id);
        }
        true
    }

    pub fn status(&self, id: &str) -> Option<JobStatus> {
        self.shared.table.status(id)
    }

    pub fn jobs(&self) -> Vec<JobStatus> {
        self.shared.table.statuses()
    }

    /// Aggregate progress across tracked jobs, 0 to 100.
    pub fn aggregate_progress(&self) -> f64 {
        self.shared.progress.total()
    }

    /// Bytes sent and total for one tracked job. A succeeded job stays
    /// tracked at 100% until the store is swept.
    pub fn job_progress(&self, id: &str) -> Option<JobProgress> {
        self.shared.progress.get(id)
    }

    /// Relay a tap on the shared notification.
    pub fn notification_pressed(&self) {
        self.shared.sink.emit(UploadEvent::NotificationPressed);
    }

    /// Resolves once no job is live.
    pub async fn wait_idle(&self) {
        let mut live = self.shared.table.subscribe_len();
        let _ = live.wait_for(|n| *n == 0).await;
    }
}
