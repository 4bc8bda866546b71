//! Byte counts per job, read cross-job for the one shared progress indicator.

use std::collections::HashMap;
use std::sync::Mutex;

/// Bytes sent / total for one job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobProgress {
    pub sent: u64,
    pub total: u64,
}

impl JobProgress {
    /// Percentage in [0, 100]; an empty job counts as done.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.sent.min(self.total) as f64 / self.total as f64) * 100.0
    }
}

/// All operations take the same lock.
#[derive(Debug, Default)]
pub struct ProgressStore {
    jobs: Mutex<HashMap<String, JobProgress>>,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, JobProgress>> {
        self.jobs.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn set(&self, id: &str, sent: u64, total: u64) {
        self.lock().insert(id.to_string(), JobProgress { sent, total });
    }

    pub fn remove(&self, id: &str) {
        self.lock().remove(id);
    }

    pub fn get(&self, id: &str) -> Option<JobProgress> {
        self.lock().get(id).copied()
    }

    /// Σsent / Σtotal × 100 over tracked jobs; 0 when nothing is tracked.
    pub fn total(&self) -> f64 {
        let jobs = self.lock();
        let (sent, total) = jobs.values().fold((0u64, 0u64), |(s, t), p| {
            (s.saturating_add(p.sent.min(p.total)), t.saturating_add(p.total))
        });
        if total == 0 {
            return 0.0;
        }
        sent as f64 / total as f64 * 100.0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
