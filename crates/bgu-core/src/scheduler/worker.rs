//! Per-job worker: network wait, slot admission, transfer, retry.

use std::sync::Arc;
use tokio::sync::{watch, OwnedSemaphorePermit};
use tokio_util::sync::CancellationToken;

use super::relay::ProgressRelay;
use super::Shared;
use crate::control::AbortSignal;
use crate::events::{Connectivity, UploadEvent};
use crate::job::{JobState, UploadJob};
use crate::network::NetworkCandidate;
use crate::retry::{classify, AttemptContext, RetryDecision, RetryState, TransferError};
use crate::transport::{TransferRequest, TransferResponse};

type BestRx = watch::Receiver<Option<NetworkCandidate>>;

enum Admission {
    Admitted(NetworkCandidate, OwnedSemaphorePermit),
    Cancelled,
}

enum Attempt {
    Finished(Result<TransferResponse, TransferError>),
    Cancelled,
    /// The network the transfer was bound to went away or was superseded.
    NetworkChanged,
}

struct Worker {
    shared: Arc<Shared>,
    job: Arc<UploadJob>,
    generation: u64,
    cancel: CancellationToken,
    network: BestRx,
}

pub(super) async fn run(
    shared: Arc<Shared>,
    job: Arc<UploadJob>,
    generation: u64,
    cancel: CancellationToken,
) {
    let network = shared.resolver.subscribe(job.network_class);
    let worker = Worker {
        shared,
        job,
        generation,
        cancel,
        network,
    };
    worker.drive().await;
}

async fn file_len(job: &UploadJob) -> u64 {
    tokio::fs::metadata(&job.path)
        .await
        .map(|m| m.len())
        .unwrap_or(0)
}

impl Worker {
    fn id(&self) -> &str {
        &self.job.id
    }

    /// Update the entry; false means this worker no longer owns it.
    fn set_state(&self, state: JobState, waiting_for_network: bool) -> bool {
        self.shared.table.update(self.id(), self.generation, |e| {
            e.state = state;
            e.waiting_for_network = waiting_for_network;
        })
    }

    /// Terminal path for an observed cancellation. Silent when the entry was
    /// already removed by `cancel()` or replaced by a newer job.
    fn finish_cancelled(&self) {
        let id = self.id().to_string();
        if self
            .shared
            .finish(&id, self.generation, UploadEvent::Cancelled { id: id.clone() })
        {
            tracing::info!(job_id = %id, "upload cancelled");
        }
    }

    async fn drive(mut self) {
        let mut retry = RetryState::default();
        let mut attempt_no = 0u32;
        loop {
            // Every attempt restarts from byte 0; the store must not keep the
            // bytes a discarded attempt had sent.
            let total = file_len(&self.job).await;
            ProgressRelay::new(Arc::clone(&self.shared), Arc::clone(&self.job), self.generation, total)
                .start();

            let (network, permit) = match self.admit().await {
                Admission::Admitted(n, p) => (n, p),
                Admission::Cancelled => return self.finish_cancelled(),
            };
            if !self.set_state(JobState::Transferring, false) {
                // Removed while we were being admitted; whoever removed it reported it.
                return;
            }
            attempt_no += 1;
            tracing::debug!(job_id = %self.id(), attempt = attempt_no, network = %network.id, "transfer starting");
            self.shared.declare(&self.job, Connectivity::Ok);

            let result = self.transfer(network, total).await;
            drop(permit);

            let err = match result {
                Attempt::Cancelled => return self.finish_cancelled(),
                Attempt::NetworkChanged => {
                    tracing::info!(job_id = %self.id(), "network changed mid-transfer, restarting");
                    continue;
                }
                Attempt::Finished(Ok(response)) => {
                    return self.finish_completed(response, total);
                }
                Attempt::Finished(Err(e)) => e,
            };

            // Read before awaiting: the watch guard must not live across the await.
            let network_usable = self.network.borrow().is_some();
            let ctx = AttemptContext {
                network_usable,
                source_exists: tokio::fs::try_exists(&self.job.path).await.unwrap_or(false),
            };
            let decision =
                self.shared
                    .policy
                    .decide(&mut retry, classify(&err), ctx, self.job.max_retries);
            self.shared.table.update(self.id(), self.generation, |e| {
                e.retries = retry.retries;
            });

            match decision {
                RetryDecision::Fail => return self.finish_failed(err, retry),
                RetryDecision::RetryNow => {
                    tracing::warn!(job_id = %self.id(), retries = retry.retries, "attempt failed, retrying: {}", err);
                }
                RetryDecision::RetryAfter(delay) => {
                    tracing::warn!(job_id = %self.id(), retries = retry.retries, delay_ms = delay.as_millis() as u64, "attempt failed, retrying: {}", err);
                    if !self.set_state(JobState::Retrying, false) {
                        return;
                    }
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return self.finish_cancelled(),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    /// Wait for a usable network, then for a transfer slot. Losing the network
    /// while queued sends the job back to waiting for one.
    async fn admit(&mut self) -> Admission {
        'deferred: loop {
            let network_ok = loop {
                if self.network.borrow_and_update().is_some() {
                    break true;
                }
                if !self.set_state(JobState::Deferred, true) {
                    return Admission::Cancelled;
                }
                let connectivity = self.shared.connectivity(self.job.network_class);
                tracing::debug!(job_id = %self.id(), ?connectivity, "waiting for network");
                self.shared.declare(&self.job, connectivity);
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => return Admission::Cancelled,
                    changed = self.network.changed() => {
                        if changed.is_err() {
                            break false;
                        }
                    }
                }
            };
            if !network_ok {
                // Resolver gone: nothing will ever change again.
                self.cancel.cancelled().await;
                return Admission::Cancelled;
            }

            if !self.set_state(JobState::Queued, false) {
                return Admission::Cancelled;
            }
            let acquire = Arc::clone(&self.shared.slots).acquire_owned();
            tokio::pin!(acquire);
            loop {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => return Admission::Cancelled,
                    permit = &mut acquire => {
                        let Ok(permit) = permit else {
                            return Admission::Cancelled;
                        };
                        let current = self.network.borrow_and_update().clone();
                        match current {
                            Some(network) => return Admission::Admitted(network, permit),
                            None => continue 'deferred,
                        }
                    }
                    changed = self.network.changed() => {
                        if changed.is_ok() && self.network.borrow_and_update().is_none() {
                            continue 'deferred;
                        }
                    }
                }
            }
        }
    }

    /// One transfer on the blocking pool. Cancellation and network changes
    /// abort it; the handle is always awaited so the slot is released only
    /// after the transport has returned.
    async fn transfer(&mut self, network: NetworkCandidate, total: u64) -> Attempt {
        let abort = AbortSignal::new();
        let request = TransferRequest {
            job: Arc::clone(&self.job),
            network: network.clone(),
        };
        let transport = Arc::clone(&self.shared.transport);
        let mut relay =
            ProgressRelay::new(Arc::clone(&self.shared), Arc::clone(&self.job), self.generation, total);
        let transport_abort = abort.clone();
        let mut handle = tokio::task::spawn_blocking(move || {
            transport.send(&request, &mut |sent| relay.on_bytes(sent), &transport_abort)
        });

        let mut watching = true;
        let attempt = loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    abort.abort();
                    let _ = (&mut handle).await;
                    break Attempt::Cancelled;
                }
                joined = &mut handle => {
                    let result = joined
                        .unwrap_or_else(|e| Err(TransferError::Transport(format!("transport task failed: {}", e))));
                    break Attempt::Finished(result);
                }
                changed = self.network.changed(), if watching => {
                    if changed.is_err() {
                        watching = false;
                        continue;
                    }
                    let still_bound = self
                        .network
                        .borrow_and_update()
                        .as_ref()
                        .is_some_and(|n| n.id == network.id);
                    if still_bound {
                        continue;
                    }
                    abort.abort();
                    let _ = (&mut handle).await;
                    break Attempt::NetworkChanged;
                }
            }
        };

        // A cancel that raced with a finishing transfer still wins.
        if self.cancel.is_cancelled() {
            return Attempt::Cancelled;
        }
        attempt
    }

    fn finish_completed(&self, response: TransferResponse, total: u64) {
        ProgressRelay::new(Arc::clone(&self.shared), Arc::clone(&self.job), self.generation, total)
            .complete();
        let status = response.status;
        let event = UploadEvent::Completed {
            id: self.job.id.clone(),
            response_code: response.status,
            response_body: response.body,
            response_headers: response.headers,
        };
        if self.shared.finish(self.id(), self.generation, event) {
            tracing::info!(job_id = %self.id(), status, "upload completed");
        }
    }

    fn finish_failed(&self, err: TransferError, retry: RetryState) {
        let event = UploadEvent::Error {
            id: self.job.id.clone(),
            error: err.to_string(),
        };
        if self.shared.finish(self.id(), self.generation, event) {
            tracing::info!(job_id = %self.id(), retries = retry.retries, "upload failed: {}", err);
        }
    }
}
