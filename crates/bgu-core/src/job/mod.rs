//! Upload jobs: typed request, validation, lifecycle states.

mod error;
mod spec;
mod state;

pub use error::ValidationError;
pub use spec::{BodyType, JobSpec, NotificationSpec};
pub use state::{JobState, JobStatus};

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use url::Url;

use crate::events::Connectivity;
use crate::network::NetworkClass;

/// How the file is put on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyMode {
    Raw,
    Multipart {
        field: String,
        parameters: BTreeMap<String, String>,
    },
}

/// Data for the shared progress notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationConfig {
    pub id: String,
    pub channel: String,
    pub title: String,
    pub title_no_internet: String,
    pub title_no_wifi: String,
}

impl NotificationConfig {
    pub fn title_for(&self, connectivity: Connectivity) -> &str {
        match connectivity {
            Connectivity::Ok => &self.title,
            Connectivity::NoInternet => &self.title_no_internet,
            Connectivity::NoPreferredNetwork => &self.title_no_wifi,
        }
    }
}

/// A validated upload request. Immutable once created; the orchestrator keeps the
/// mutable lifecycle state separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadJob {
    pub id: String,
    pub url: Url,
    pub path: PathBuf,
    pub method: String,
    pub headers: HashMap<String, String>,
    pub body: BodyMode,
    /// Counted-retry budget.
    pub max_retries: u32,
    pub network_class: NetworkClass,
    pub notification: NotificationConfig,
}
