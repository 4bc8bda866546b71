//! HTTP transport seam.
//!
//! The orchestrator only sees [`Transport`]; [`CurlTransport`] is the libcurl
//! implementation. Calls are blocking and run on tokio's blocking pool.

mod libcurl;
mod parse;

pub use libcurl::CurlTransport;
pub use parse::parse_response_headers;

use std::collections::HashMap;
use std::sync::Arc;

use crate::control::AbortSignal;
use crate::job::UploadJob;
use crate::network::NetworkCandidate;
use crate::retry::TransferError;

/// One attempt of one job, bound to the network it was admitted on.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub job: Arc<UploadJob>,
    pub network: NetworkCandidate,
}

/// What the server answered. Any status code is a completed transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferResponse {
    pub status: u32,
    pub headers: HashMap<String, String>,
    pub body: String,
}

/// Sends one job's file. Blocking.
///
/// `on_progress` receives the running count of body bytes sent. The call must
/// return [`TransferError::Aborted`] promptly once `abort` is raised.
pub trait Transport: Send + Sync + 'static {
    fn send(
        &self,
        request: &TransferRequest,
        on_progress: &mut dyn FnMut(u64),
        abort: &AbortSignal,
    ) -> Result<TransferResponse, TransferError>;
}
