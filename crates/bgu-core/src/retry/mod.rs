//! Retry classification and policy.
//!
//! Transports report a [`TransferError`]; [`classify`] maps it to an
//! [`ErrorKind`] and [`RetryPolicy::decide`] turns that plus the current
//! network/file situation into a [`RetryDecision`]. Server responses of any
//! status never reach this module: they are completed transfers.

mod classify;
mod error;
mod policy;

pub use classify::{classify, classify_curl_error};
pub use error::TransferError;
pub use policy::{AttemptContext, ErrorKind, RetryDecision, RetryPolicy, RetryState};
