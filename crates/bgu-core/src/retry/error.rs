//! Transfer error type for retry classification.

/// Error returned by one transfer attempt. Kept separate from `anyhow` so the
/// orchestrator can classify it before deciding on a retry.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// The attempt was stopped through its [`AbortSignal`](crate::control::AbortSignal).
    #[error("transfer aborted")]
    Aborted,
    /// The server host (or proxy) name could not be resolved.
    #[error("could not resolve host: {0}")]
    NameResolution(String),
    /// Reading the source file failed (missing, unreadable, truncated while sending).
    #[error("local file: {0}")]
    LocalIo(#[source] std::io::Error),
    /// libcurl reported any other failure (connect, send, timeout, TLS...).
    #[error("{0}")]
    Curl(#[source] curl::Error),
    /// Failure reported by a non-curl transport.
    #[error("{0}")]
    Transport(String),
}

impl From<curl::Error> for TransferError {
    fn from(e: curl::Error) -> Self {
        crate::retry::classify::from_curl(e)
    }
}
