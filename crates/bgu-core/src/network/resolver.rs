//! Debounced best-network resolution, one watch channel per usage class.

use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::candidate::{NetworkCandidate, NetworkClass, NetworkSnapshot};
use super::select::compute_best;

type BestTx = watch::Sender<Option<NetworkCandidate>>;

/// Turns a stream of snapshots into the best network per class.
///
/// Subscribers are only woken when the *identity* of the selected network
/// changes; capability churn on the same network updates the stored value
/// silently. Bursts of snapshots are collapsed by a quiet window.
pub struct NetworkResolver {
    default_tx: BestTx,
    constrained_tx: BestTx,
    cancel: CancellationToken,
}

impl NetworkResolver {
    /// Resolves the current snapshot immediately, then follows `snapshots` on a
    /// background task until the source closes or the resolver is dropped.
    /// Must be called from within a tokio runtime.
    pub fn spawn(mut snapshots: watch::Receiver<NetworkSnapshot>, debounce: Duration) -> Self {
        let initial = snapshots.borrow_and_update().clone();
        let (default_tx, _) = watch::channel(compute_best(NetworkClass::Default, &initial));
        let (constrained_tx, _) =
            watch::channel(compute_best(NetworkClass::ConstrainedPreferred, &initial));
        let cancel = CancellationToken::new();

        let resolver = Self {
            default_tx: default_tx.clone(),
            constrained_tx: constrained_tx.clone(),
            cancel: cancel.clone(),
        };

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    changed = snapshots.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                }
                // Quiet window: restart the timer on every further change.
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        _ = tokio::time::sleep(debounce) => break,
                        changed = snapshots.changed() => {
                            if changed.is_err() {
                                break;
                            }
                        }
                    }
                }
                let snapshot = snapshots.borrow_and_update().clone();
                publish(&default_tx, NetworkClass::Default, &snapshot);
                publish(&constrained_tx, NetworkClass::ConstrainedPreferred, &snapshot);
            }
        });

        resolver
    }

    fn sender(&self, class: NetworkClass) -> &BestTx {
        match class {
            NetworkClass::Default => &self.default_tx,
            NetworkClass::ConstrainedPreferred => &self.constrained_tx,
        }
    }

    /// Best network for `class` right now.
    pub fn current(&self, class: NetworkClass) -> Option<NetworkCandidate> {
        self.sender(class).borrow().clone()
    }

    /// Receiver woken whenever the best network for `class` changes identity.
    pub fn subscribe(&self, class: NetworkClass) -> watch::Receiver<Option<NetworkCandidate>> {
        self.sender(class).subscribe()
    }

    /// Stop following the snapshot source. Current values stay readable.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for NetworkResolver {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Store the new best network; notify only if its identity changed.
fn publish(tx: &BestTx, class: NetworkClass, snapshot: &NetworkSnapshot) {
    let best = compute_best(class, snapshot);
    let changed = tx.send_if_modified(|current| {
        let identity_changed = current.as_ref().map(|c| c.id) != best.as_ref().map(|c| c.id);
        *current = best.clone();
        identity_changed
    });
    if changed {
        match &best {
            Some(c) => tracing::info!(class = ?class, network = %c.id, transport = ?c.caps.transport, "best network changed"),
            None => tracing::info!(class = ?class, "no usable network"),
        }
    }
}
