//! Classify transfer errors into retry policy error kinds.

use super::error::TransferError;
use super::policy::ErrorKind;

/// Classify a curl error for retry decisions.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_couldnt_resolve_host() || e.is_couldnt_resolve_proxy() {
        return ErrorKind::NameResolution;
    }
    if e.is_aborted_by_callback() {
        return ErrorKind::Aborted;
    }
    if e.is_read_error() || e.is_file_couldnt_read_file() {
        return ErrorKind::LocalIo;
    }
    ErrorKind::Transport
}

/// Classify a transfer error into an ErrorKind.
pub fn classify(e: &TransferError) -> ErrorKind {
    match e {
        TransferError::Aborted => ErrorKind::Aborted,
        TransferError::NameResolution(_) => ErrorKind::NameResolution,
        TransferError::LocalIo(_) => ErrorKind::LocalIo,
        TransferError::Curl(ce) => classify_curl_error(ce),
        TransferError::Transport(_) => ErrorKind::Transport,
    }
}

/// Lift name-resolution and abort failures out of the opaque curl error so
/// the variant alone carries the classification.
pub(super) fn from_curl(e: curl::Error) -> TransferError {
    match classify_curl_error(&e) {
        ErrorKind::NameResolution => TransferError::NameResolution(e.description().to_string()),
        ErrorKind::Aborted => TransferError::Aborted,
        _ => TransferError::Curl(e),
    }
}
