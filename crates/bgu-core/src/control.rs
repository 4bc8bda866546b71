//! Abort signals for in-flight transfers, and the control socket location.
//!
//! Each transfer attempt gets its own [`AbortSignal`]. The orchestrator raises it
//! when the job is cancelled, replaced, or its network goes away; the transport
//! polls it from inside its I/O callbacks and bails out with
//! [`TransferError::Aborted`](crate::retry::TransferError::Aborted).

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared abort flag for one transfer attempt. Cheap to clone; all clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    flag: Arc<AtomicBool>,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the transfer stop as soon as possible.
    pub fn abort(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Default path for the control socket (XDG state dir).
pub fn default_control_socket_path() -> std::io::Result<PathBuf> {
    let dir = xdg::BaseDirectories::with_prefix("bgu")?.get_state_home();
    Ok(dir.join("control.sock"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let signal = AbortSignal::new();
        let seen_by_transport = signal.clone();
        assert!(!seen_by_transport.is_aborted());
        signal.abort();
        assert!(seen_by_transport.is_aborted());
    }
}
