//! Pure best-network selection.

use super::candidate::{
    Capabilities, NetworkCandidate, NetworkClass, NetworkSnapshot, TransportKind,
};

/// Preference cascade. Each filter applies only if it leaves at least one candidate.
const PREFERENCES: [fn(&Capabilities) -> bool; 5] =
    [trusted, unmetered, unrestricted, not_roaming, on_wifi];

fn trusted(c: &Capabilities) -> bool {
    c.trusted
}

fn unmetered(c: &Capabilities) -> bool {
    !c.metered
}

fn unrestricted(c: &Capabilities) -> bool {
    !c.restricted
}

fn not_roaming(c: &Capabilities) -> bool {
    !c.roaming
}

fn on_wifi(c: &Capabilities) -> bool {
    c.transport == TransportKind::Wifi
}

/// Picks the network jobs of `class` should use, or `None` when nothing qualifies.
///
/// 1. The OS active network wins if it passes the class filter.
/// 2. Otherwise the preference cascade narrows the usable set.
/// 3. Highest bandwidth among the survivors; ties go to the first seen.
///
/// Deterministic for a given snapshot.
pub fn compute_best(class: NetworkClass, snapshot: &NetworkSnapshot) -> Option<NetworkCandidate> {
    let usable: Vec<NetworkCandidate> = snapshot
        .networks
        .iter()
        .filter_map(|entry| {
            let caps = entry.caps.as_ref()?;
            class.admits(caps).then(|| NetworkCandidate {
                id: entry.id,
                caps: caps.clone(),
            })
        })
        .collect();

    if let Some(active) = snapshot.active {
        if let Some(c) = usable.iter().find(|c| c.id == active) {
            return Some(c.clone());
        }
    }

    let mut pool: Vec<&NetworkCandidate> = usable.iter().collect();
    for prefer in PREFERENCES {
        let narrowed: Vec<&NetworkCandidate> =
            pool.iter().copied().filter(|c| prefer(&c.caps)).collect();
        if !narrowed.is_empty() {
            pool = narrowed;
        }
    }

    let mut best: Option<&NetworkCandidate> = None;
    for c in pool {
        match best {
            Some(b) if b.caps.bandwidth_kbps >= c.caps.bandwidth_kbps => {}
            _ => best = Some(c),
        }
    }
    best.cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::candidate::{NetworkEntry, NetworkId};

    fn entry(id: u64, caps: Capabilities) -> NetworkEntry {
        NetworkEntry {
            id: NetworkId(id),
            caps: Some(caps),
        }
    }

    #[test]
    fn empty_snapshot_has_no_best() {
        assert!(compute_best(NetworkClass::Default, &NetworkSnapshot::default()).is_none());
    }

    #[test]
    fn active_network_preferred_when_usable() {
        let snapshot = NetworkSnapshot {
            active: Some(NetworkId(2)),
            networks: vec![
                entry(1, Capabilities::usable(TransportKind::Wifi).with_bandwidth(100_000)),
                entry(2, Capabilities::usable(TransportKind::Cellular).with_bandwidth(10)),
            ],
        };
        let best = compute_best(NetworkClass::Default, &snapshot).unwrap();
        assert_eq!(best.id, NetworkId(2));

        // The constrained class cannot use the metered active network.
        let best = compute_best(NetworkClass::ConstrainedPreferred, &snapshot).unwrap();
        assert_eq!(best.id, NetworkId(1));
    }

    #[test]
    fn cascade_prefers_unmetered_over_bandwidth() {
        let snapshot = NetworkSnapshot {
            active: None,
            networks: vec![
                entry(1, Capabilities::usable(TransportKind::Cellular).with_bandwidth(500_000)),
                entry(2, Capabilities::usable(TransportKind::Wifi).with_bandwidth(20_000)),
            ],
        };
        let best = compute_best(NetworkClass::Default, &snapshot).unwrap();
        assert_eq!(best.id, NetworkId(2));
    }

    #[test]
    fn highest_bandwidth_then_first_seen() {
        let snapshot = NetworkSnapshot {
            active: None,
            networks: vec![
                entry(1, Capabilities::usable(TransportKind::Wifi).with_bandwidth(50)),
                entry(2, Capabilities::usable(TransportKind::Wifi).with_bandwidth(80)),
                entry(3, Capabilities::usable(TransportKind::Wifi).with_bandwidth(80)),
            ],
        };
        assert_eq!(
            compute_best(NetworkClass::Default, &snapshot).unwrap().id,
            NetworkId(2)
        );
    }

    #[test]
    fn selection_is_idempotent() {
        let snapshot = NetworkSnapshot {
            active: Some(NetworkId(9)),
            networks: vec![
                entry(4, Capabilities::usable(TransportKind::Ethernet).with_bandwidth(1_000)),
                entry(5, Capabilities::usable(TransportKind::Wifi).with_bandwidth(1_000)),
            ],
        };
        for class in NetworkClass::ALL {
            assert_eq!(compute_best(class, &snapshot), compute_best(class, &snapshot));
        }
    }

    #[test]
    fn never_selects_networks_failing_the_class_filter() {
        let mut unvalidated = Capabilities::usable(TransportKind::Wifi).with_bandwidth(1_000_000);
        unvalidated.validated = false;
        let snapshot = NetworkSnapshot {
            active: Some(NetworkId(1)),
            networks: vec![
                entry(1, unvalidated),
                NetworkEntry {
                    id: NetworkId(2),
                    caps: None,
                },
                entry(3, Capabilities::usable(TransportKind::Cellular)),
            ],
        };
        let best = compute_best(NetworkClass::Default, &snapshot).unwrap();
        assert_eq!(best.id, NetworkId(3));
        assert!(compute_best(NetworkClass::ConstrainedPreferred, &snapshot).is_none());
    }
}
