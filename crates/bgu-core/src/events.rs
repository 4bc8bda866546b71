//! Outward events, the shared notification data, and long-running-task registration.

use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::mpsc;

/// One lifecycle event. Per job the order is `progress* (completed | error | cancelled)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UploadEvent {
    Progress {
        id: String,
        /// Percentage of this job's bytes sent, 0 to 100.
        progress: f64,
    },
    Completed {
        id: String,
        response_code: u32,
        response_body: String,
        response_headers: HashMap<String, String>,
    },
    Error {
        id: String,
        error: String,
    },
    Cancelled {
        id: String,
    },
    NotificationPressed,
}

impl UploadEvent {
    /// Job the event belongs to (`None` for notification taps).
    pub fn job_id(&self) -> Option<&str> {
        match self {
            UploadEvent::Progress { id, .. }
            | UploadEvent::Completed { id, .. }
            | UploadEvent::Error { id, .. }
            | UploadEvent::Cancelled { id } => Some(id),
            UploadEvent::NotificationPressed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UploadEvent::Completed { .. } | UploadEvent::Error { .. } | UploadEvent::Cancelled { .. }
        )
    }
}

/// Receiver of orchestrator events. Must not block or panic; failures are the
/// sink's to swallow. Called with the job table locked, so it must not call
/// back into the [`Uploader`](crate::scheduler::Uploader).
pub trait EventSink: Send + Sync {
    fn emit(&self, event: UploadEvent);
}

/// Inactive sink: drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: UploadEvent) {}
}

/// Forwards events to a tokio channel. A dropped receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<UploadEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<UploadEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: UploadEvent) {
        let _ = self.tx.send(event);
    }
}

/// Network situation shown in the notification title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    Ok,
    NoInternet,
    /// A usable network exists, but not one the job's class accepts (no Wi-Fi).
    NoPreferredNetwork,
}

/// Everything needed to render the one shared progress notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub notification_id: String,
    pub channel: String,
    pub title: String,
    /// Aggregate progress across all tracked jobs, 0 to 100.
    pub progress: f64,
    pub connectivity: Connectivity,
}

/// Declares the process as doing long-running work. Called before each transfer,
/// on every progress tick, and when a job's connectivity changes.
pub trait KeepAlive: Send + Sync {
    fn declare(&self, notice: &Notice);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopKeepAlive;

impl KeepAlive for NoopKeepAlive {
    fn declare(&self, _notice: &Notice) {}
}
