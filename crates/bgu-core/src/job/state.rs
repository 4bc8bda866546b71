//! Lifecycle states of a live job.

use serde::Serialize;

/// Where a job is in its lifecycle.
///
/// `Deferred` → `Queued` → `Transferring` → one of `Succeeded`, `Retrying`,
/// `Cancelled`, `Failed`. `Retrying` loops back to `Queued` after its delay;
/// a `Transferring` job whose network disappears drops back to `Deferred`.
///
/// The terminal states name outcomes only. A job leaves the live table the
/// moment it reaches one, so [`Uploader::status`](crate::Uploader::status)
/// never reports them; the terminal event on the sink is the only signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// No usable network for the job's class.
    Deferred,
    /// Network is usable; waiting for a concurrency slot.
    Queued,
    Transferring,
    /// Waiting out a retry delay.
    Retrying,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::Cancelled
        )
    }
}

/// Snapshot of a live job (CLI / embedding-friendly).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobStatus {
    pub id: String,
    pub state: JobState,
    /// Counted retries so far; reset by connectivity failures.
    pub retries: u32,
    pub waiting_for_network: bool,
}
