use std::time::Duration;

use crate::config::UploaderConfig;

/// High-level classification of a failed attempt for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Server host or proxy could not be resolved.
    NameResolution,
    /// Reading the source file failed.
    LocalIo,
    /// Any other transport failure (connect, reset, timeout, TLS...).
    Transport,
    /// The attempt was aborted through its signal.
    Aborted,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Re-enter the queue immediately.
    RetryNow,
    /// Re-enter the queue after the given delay.
    RetryAfter(Duration),
    /// Give up: the job fails with the attempt's error.
    Fail,
}

/// What the orchestrator knows about the world when an attempt fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptContext {
    /// The job's network class currently has a usable network.
    pub network_usable: bool,
    /// The job's source file still exists.
    pub source_exists: bool,
}

/// Per-job retry counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    /// Counted failures since the last uncounted one.
    pub retries: u32,
}

/// Fixed (linear) delay policy.
///
/// Connectivity trouble and DNS failures are retried without limit and reset
/// the counter; everything else consumes the job's budget.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Delay between counted or DNS retries.
    pub retry_delay: Duration,
    /// Delay when the network is gone at failure time.
    pub connectivity_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_secs(10),
            connectivity_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &UploaderConfig) -> Self {
        Self {
            retry_delay: cfg.retry_delay(),
            connectivity_delay: cfg.connectivity_retry_delay(),
        }
    }

    fn after(delay: Duration) -> RetryDecision {
        if delay.is_zero() {
            RetryDecision::RetryNow
        } else {
            RetryDecision::RetryAfter(delay)
        }
    }

    /// Decide what happens after a failed attempt, updating `state`.
    ///
    /// Order: unusable network, then name resolution (both uncounted, counter
    /// reset), then a local I/O error with the source gone (fail), then a
    /// counted retry that fails once the counter exceeds `max_retries`.
    pub fn decide(
        &self,
        state: &mut RetryState,
        kind: ErrorKind,
        ctx: AttemptContext,
        max_retries: u32,
    ) -> RetryDecision {
        if kind == ErrorKind::Aborted {
            return RetryDecision::Fail;
        }
        if !ctx.network_usable {
            state.retries = 0;
            return Self::after(self.connectivity_delay);
        }
        if kind == ErrorKind::NameResolution {
            state.retries = 0;
            return Self::after(self.retry_delay);
        }
        if kind == ErrorKind::LocalIo && !ctx.source_exists {
            return RetryDecision::Fail;
        }
        state.retries = state.retries.saturating_add(1);
        if state.retries <= max_retries {
            Self::after(self.retry_delay)
        } else {
            RetryDecision::Fail
        }
    }
}
