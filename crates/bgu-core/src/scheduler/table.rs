//! Live job table.
//!
//! Every entry carries a generation. Workers act on their entry only while the
//! generation still matches, so a replaced or cancelled job's worker can never
//! touch its successor. Removing the entry is the single gate for the
//! terminal event: whoever removes it emits, everyone else stays silent.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::job::{JobState, JobStatus, UploadJob};

#[derive(Debug)]
pub(super) struct JobEntry {
    pub(super) generation: u64,
    pub(super) job: Arc<UploadJob>,
    pub(super) state: JobState,
    pub(super) retries: u32,
    pub(super) waiting_for_network: bool,
    pub(super) cancel: CancellationToken,
}

impl JobEntry {
    fn status(&self) -> JobStatus {
        JobStatus {
            id: self.job.id.clone(),
            state: self.state,
            retries: self.retries,
            waiting_for_network: self.waiting_for_network,
        }
    }
}

/// Result of a cancel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum CancelOutcome {
    NotFound,
    /// No transfer in flight: the entry was removed on the spot.
    Removed,
    /// A transfer is in flight: its worker was signalled and will finish the job.
    Signalled,
}

#[derive(Default)]
struct TableInner {
    next_generation: u64,
    jobs: HashMap<String, JobEntry>,
}

pub(super) struct JobTable {
    inner: Mutex<TableInner>,
    live: watch::Sender<usize>,
}

impl JobTable {
    pub(super) fn new() -> Self {
        let (live, _) = watch::channel(0);
        Self {
            inner: Mutex::new(TableInner::default()),
            live,
        }
    }

    fn lock(&self) -> MutexGuard<'_, TableInner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn publish_len(&self, inner: &TableInner) {
        self.live.send_replace(inner.jobs.len());
    }

    /// Insert `job`, replacing any live entry with the same id. Returns the new
    /// generation, the new entry's cancel token, and the replaced entry's token.
    pub(super) fn insert(
        &self,
        job: Arc<UploadJob>,
        state: JobState,
    ) -> (u64, CancellationToken, Option<CancellationToken>) {
        let mut inner = self.lock();
        inner.next_generation += 1;
        let generation = inner.next_generation;
        let cancel = CancellationToken::new();
        let entry = JobEntry {
            generation,
            job: Arc::clone(&job),
            state,
            retries: 0,
            waiting_for_network: state == JobState::Deferred,
            cancel: cancel.clone(),
        };
        let replaced = inner.jobs.insert(job.id.clone(), entry).map(|old| old.cancel);
        self.publish_len(&inner);
        (generation, cancel, replaced)
    }

    /// Apply `f` to the entry if `generation` is still current.
    pub(super) fn update(&self, id: &str, generation: u64, f: impl FnOnce(&mut JobEntry)) -> bool {
        let mut inner = self.lock();
        match inner.jobs.get_mut(id) {
            Some(entry) if entry.generation == generation => {
                f(entry);
                true
            }
            _ => false,
        }
    }

    /// Run `f` under the table lock if `generation` is still current. Used to
    /// order progress events strictly before the terminal event.
    pub(super) fn with_current<R>(&self, id: &str, generation: u64, f: impl FnOnce() -> R) -> Option<R> {
        let inner = self.lock();
        match inner.jobs.get(id) {
            Some(entry) if entry.generation == generation => Some(f()),
            _ => None,
        }
    }

    /// Remove the entry if `generation` is current and run `f` under the lock.
    /// Returns false if someone else already removed or replaced it.
    pub(super) fn remove_current(&self, id: &str, generation: u64, f: impl FnOnce(&JobEntry)) -> bool {
        let mut inner = self.lock();
        let current = matches!(inner.jobs.get(id), Some(e) if e.generation == generation);
        if !current {
            return false;
        }
        if let Some(entry) = inner.jobs.remove(id) {
            f(&entry);
        }
        self.publish_len(&inner);
        true
    }

    /// Cancel the job `id`. An entry without a transfer in flight is removed and
    /// `on_removed` runs under the lock; a transferring entry is only signalled.
    pub(super) fn cancel(&self, id: &str, on_removed: impl FnOnce(&JobEntry)) -> CancelOutcome {
        let mut inner = self.lock();
        let transferring = match inner.jobs.get(id) {
            None => return CancelOutcome::NotFound,
            Some(entry) => entry.state == JobState::Transferring,
        };
        if transferring {
            if let Some(entry) = inner.jobs.get(id) {
                entry.cancel.cancel();
            }
            return CancelOutcome::Signalled;
        }
        if let Some(entry) = inner.jobs.remove(id) {
            entry.cancel.cancel();
            on_removed(&entry);
        }
        self.publish_len(&inner);
        CancelOutcome::Removed
    }

    pub(super) fn status(&self, id: &str) -> Option<JobStatus> {
        self.lock().jobs.get(id).map(JobEntry::status)
    }

    /// All live jobs, sorted by id.
    pub(super) fn statuses(&self) -> Vec<JobStatus> {
        let mut out: Vec<JobStatus> = self.lock().jobs.values().map(JobEntry::status).collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    pub(super) fn ids(&self) -> Vec<String> {
        self.lock().jobs.keys().cloned().collect()
    }

    pub(super) fn len(&self) -> usize {
        self.lock().jobs.len()
    }

    /// Number of live jobs, updated on every insert and removal.
    pub(super) fn subscribe_len(&self) -> watch::Receiver<usize> {
        self.live.subscribe()
    }
}
