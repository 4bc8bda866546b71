//! Loosely-populated job request and its validation into an [`UploadJob`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use url::Url;

use super::error::ValidationError;
use super::{BodyMode, NotificationConfig, UploadJob};
use crate::network::NetworkClass;

const DEFAULT_METHOD: &str = "POST";
const DEFAULT_NOTIFICATION_ID: &str = "bgu-uploads";
const DEFAULT_NOTIFICATION_CHANNEL: &str = "BackgroundUploadChannel";
const DEFAULT_TITLE: &str = "Uploading files";
const DEFAULT_TITLE_NO_INTERNET: &str = "Waiting for internet connection";
const DEFAULT_TITLE_NO_WIFI: &str = "Waiting for Wi-Fi";

/// Request body encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyType {
    /// The file is the request body.
    #[default]
    Raw,
    /// `multipart/form-data` with the file under `field`.
    Multipart,
}

/// Notification metadata. Every field is optional; gaps get defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSpec {
    #[serde(alias = "notificationId")]
    pub id: Option<String>,
    #[serde(alias = "notificationChannel")]
    pub channel: Option<String>,
    #[serde(alias = "notificationTitle")]
    pub title: Option<String>,
    #[serde(alias = "notificationTitleNoInternet")]
    pub title_no_internet: Option<String>,
    #[serde(alias = "notificationTitleNoWifi")]
    pub title_no_wifi: Option<String>,
}

/// Upload request as received from the application layer.
///
/// Field names follow the wire format (snake_case, with camelCase aliases).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSpec {
    /// Caller-chosen id; starting a job with a live id replaces that job.
    #[serde(alias = "customUploadId")]
    pub id: Option<String>,
    pub url: Option<String>,
    pub path: Option<PathBuf>,
    pub method: Option<String>,
    pub headers: HashMap<String, String>,
    #[serde(rename = "type")]
    pub body_type: BodyType,
    /// Multipart form field carrying the file.
    pub field: Option<String>,
    /// Extra multipart text fields.
    pub parameters: Option<BTreeMap<String, String>>,
    #[serde(alias = "maxRetries")]
    pub max_retries: Option<u32>,
    /// Only run on unmetered, Wi-Fi-like networks.
    #[serde(alias = "wifiOnly", alias = "isDiscretionary")]
    pub wifi_only: bool,
    pub notification: NotificationSpec,
}

impl JobSpec {
    /// Raw upload of `path` to `url` with every other field defaulted.
    pub fn raw(url: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            url: Some(url.into()),
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Builder-style id override.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Check every field and produce an immutable job. A missing id is generated.
    pub fn validate(self, default_max_retries: u32) -> Result<UploadJob, ValidationError> {
        let url_str = non_empty(self.url).ok_or(ValidationError::MissingField("url"))?;
        let url = parse_url(&url_str)?;
        let path = self
            .path
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(ValidationError::MissingField("path"))?;

        let method = match self.method {
            Some(m) => normalize_method(&m)?,
            None => DEFAULT_METHOD.to_string(),
        };

        for name in self.headers.keys() {
            if name.trim().is_empty() || name.contains(':') {
                return Err(ValidationError::InvalidHeader(name.clone()));
            }
        }

        let body = match self.body_type {
            BodyType::Raw => {
                if self.parameters.is_some() {
                    return Err(ValidationError::ParametersRequireMultipart);
                }
                BodyMode::Raw
            }
            BodyType::Multipart => BodyMode::Multipart {
                field: non_empty(self.field).ok_or(ValidationError::MissingField("field"))?,
                parameters: self.parameters.unwrap_or_default(),
            },
        };

        let id = match self.id {
            Some(id) if id.trim().is_empty() => return Err(ValidationError::InvalidId),
            Some(id) => id,
            None => uuid::Uuid::new_v4().to_string(),
        };

        let n = self.notification;
        let notification = NotificationConfig {
            id: n.id.unwrap_or_else(|| DEFAULT_NOTIFICATION_ID.to_string()),
            channel: n
                .channel
                .unwrap_or_else(|| DEFAULT_NOTIFICATION_CHANNEL.to_string()),
            title: n.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            title_no_internet: n
                .title_no_internet
                .unwrap_or_else(|| DEFAULT_TITLE_NO_INTERNET.to_string()),
            title_no_wifi: n
                .title_no_wifi
                .unwrap_or_else(|| DEFAULT_TITLE_NO_WIFI.to_string()),
        };

        Ok(UploadJob {
            id,
            url,
            path,
            method,
            headers: self.headers,
            body,
            max_retries: self.max_retries.unwrap_or(default_max_retries),
            network_class: if self.wifi_only {
                NetworkClass::ConstrainedPreferred
            } else {
                NetworkClass::Default
            },
            notification,
        })
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

fn parse_url(raw: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(raw.trim()).map_err(|e| ValidationError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ValidationError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

/// RFC 7230 token, upper-cased.
fn normalize_method(raw: &str) -> Result<String, ValidationError> {
    let m = raw.trim();
    let is_tchar = |c: char| c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c);
    if m.is_empty() || !m.chars().all(is_tchar) {
        return Err(ValidationError::InvalidMethod(raw.to_string()));
    }
    Ok(m.to_ascii_uppercase())
}
