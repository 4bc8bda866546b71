//! Adapter from OS network callbacks to a stream of snapshots.
//!
//! Platform glue calls the `on_*` methods from its callback thread; the
//! resolver subscribes to the snapshot channel.

use std::sync::Mutex;
use tokio::sync::watch;

use super::candidate::{Capabilities, NetworkEntry, NetworkId, NetworkSnapshot};

#[derive(Debug, Clone)]
struct Tracked {
    id: NetworkId,
    caps: Option<Capabilities>,
    blocked: bool,
}

#[derive(Debug, Default)]
struct MonitorState {
    active: Option<NetworkId>,
    /// First-seen order.
    tracked: Vec<Tracked>,
}

impl MonitorState {
    fn snapshot(&self) -> NetworkSnapshot {
        NetworkSnapshot {
            active: self.active,
            networks: self
                .tracked
                .iter()
                .map(|t| NetworkEntry {
                    id: t.id,
                    caps: if t.blocked { None } else { t.caps.clone() },
                })
                .collect(),
        }
    }

    fn find(&mut self, id: NetworkId) -> Option<&mut Tracked> {
        self.tracked.iter_mut().find(|t| t.id == id)
    }
}

/// Live set of networks, fed by callbacks, published as snapshots.
pub struct NetworkMonitor {
    state: Mutex<MonitorState>,
    tx: watch::Sender<NetworkSnapshot>,
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkMonitor {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(NetworkSnapshot::default());
        Self {
            state: Mutex::new(MonitorState::default()),
            tx,
        }
    }

    /// Snapshot stream for [`NetworkResolver::spawn`](super::NetworkResolver::spawn).
    pub fn subscribe(&self) -> watch::Receiver<NetworkSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> NetworkSnapshot {
        self.tx.borrow().clone()
    }

    fn update(&self, f: impl FnOnce(&mut MonitorState)) {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut state);
        let next = state.snapshot();
        self.tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    /// A network became available. `caps` is the capability lookup result; `None`
    /// (lookup raced with teardown) keeps the network listed but unusable.
    pub fn on_available(&self, id: NetworkId, caps: Option<Capabilities>) {
        tracing::debug!(network = %id, "network available");
        self.update(|s| match s.find(id) {
            Some(t) => t.caps = caps,
            None => s.tracked.push(Tracked {
                id,
                caps,
                blocked: false,
            }),
        });
    }

    pub fn on_lost(&self, id: NetworkId) {
        tracing::debug!(network = %id, "network lost");
        self.update(|s| {
            s.tracked.retain(|t| t.id != id);
            if s.active == Some(id) {
                s.active = None;
            }
        });
    }

    /// Ignored for networks that were never reported available.
    pub fn on_capabilities_changed(&self, id: NetworkId, caps: Option<Capabilities>) {
        self.update(|s| {
            if let Some(t) = s.find(id) {
                t.caps = caps;
            }
        });
    }

    pub fn on_blocked_changed(&self, id: NetworkId, blocked: bool) {
        tracing::debug!(network = %id, blocked, "network blocked status changed");
        self.update(|s| {
            if let Some(t) = s.find(id) {
                t.blocked = blocked;
            }
        });
    }

    /// The OS default network changed.
    pub fn set_active(&self, id: Option<NetworkId>) {
        self.update(|s| s.active = id);
    }

    /// Replace the whole picture at once (polling sources). Networks keep their
    /// first-seen position; new ones are appended; missing ones are dropped.
    pub fn replace_all(&self, active: Option<NetworkId>, networks: Vec<(NetworkId, Option<Capabilities>)>) {
        self.update(|s| {
            let mut next: Vec<Tracked> = Vec::with_capacity(networks.len());
            for t in &s.tracked {
                if let Some((_, caps)) = networks.iter().find(|(id, _)| *id == t.id) {
                    next.push(Tracked {
                        id: t.id,
                        caps: caps.clone(),
                        blocked: t.blocked,
                    });
                }
            }
            for (id, caps) in networks {
                if !next.iter().any(|t| t.id == id) {
                    next.push(Tracked {
                        id,
                        caps,
                        blocked: false,
                    });
                }
            }
            s.tracked = next;
            s.active = active;
        });
    }
}
