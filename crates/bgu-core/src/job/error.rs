//! Validation errors for job specs.

/// A job spec that cannot become an [`UploadJob`](super::UploadJob). Returned
/// synchronously from `start`; no job is created.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing '{0}' field")]
    MissingField(&'static str),
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("invalid HTTP method '{0}'")]
    InvalidMethod(String),
    #[error("invalid header name '{0}'")]
    InvalidHeader(String),
    #[error("parameters are supported only for multipart uploads")]
    ParametersRequireMultipart,
    #[error("upload id must not be empty")]
    InvalidId,
}
