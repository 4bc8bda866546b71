//! Linux network source: polls `/sys/class/net` and `/proc/net/route` and feeds a
//! [`NetworkMonitor`].
//!
//! sysfs exposes no validation or metering information, so every interface that
//! is up and has a default route counts as validated, and cellular (`ww*`)
//! interfaces are reported as metered.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::candidate::{Capabilities, NetworkId, TransportKind};
use super::monitor::NetworkMonitor;

/// Roots to read from; overridable for tests.
#[derive(Debug, Clone)]
pub struct SysfsPaths {
    pub class_net: PathBuf,
    pub proc_route: PathBuf,
}

impl Default for SysfsPaths {
    fn default() -> Self {
        Self {
            class_net: PathBuf::from("/sys/class/net"),
            proc_route: PathBuf::from("/proc/net/route"),
        }
    }
}

/// One interface as read from sysfs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    pub index: u64,
    pub transport: TransportKind,
    pub up: bool,
    pub speed_mbps: Option<u64>,
}

/// A default route entry from `/proc/net/route`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultRoute {
    pub interface: String,
    pub metric: u32,
}

fn read_trimmed(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}

fn transport_for(name: &str, dir: &Path) -> TransportKind {
    if dir.join("wireless").exists() || dir.join("phy80211").exists() {
        return TransportKind::Wifi;
    }
    if name.starts_with("ww") {
        return TransportKind::Cellular;
    }
    if ["tun", "tap", "wg", "ppp"].iter().any(|p| name.starts_with(p)) {
        return TransportKind::Vpn;
    }
    if name.starts_with("en") || name.starts_with("eth") {
        return TransportKind::Ethernet;
    }
    TransportKind::Other
}

/// Read every non-loopback interface under `class_net`, sorted by ifindex.
pub fn read_interfaces(class_net: &Path) -> std::io::Result<Vec<Interface>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(class_net)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == "lo" {
            continue;
        }
        let dir = entry.path();
        let Some(index) = read_trimmed(&dir.join("ifindex")).and_then(|s| s.parse().ok()) else {
            continue;
        };
        let operstate = read_trimmed(&dir.join("operstate")).unwrap_or_default();
        let carrier = read_trimmed(&dir.join("carrier")).as_deref() == Some("1");
        let up = operstate == "up" || (operstate == "unknown" && carrier);
        // Virtual links report -1 or refuse the read.
        let speed_mbps = read_trimmed(&dir.join("speed"))
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|&s| s > 0)
            .map(|s| s as u64);
        out.push(Interface {
            transport: transport_for(&name, &dir),
            name,
            index,
            up,
            speed_mbps,
        });
    }
    out.sort_by_key(|i| i.index);
    Ok(out)
}

/// Parse the default routes (destination and mask both zero) out of `/proc/net/route`.
pub fn parse_default_routes(content: &str) -> Vec<DefaultRoute> {
    content
        .lines()
        .skip(1)
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            // Iface Destination Gateway Flags RefCnt Use Metric Mask ...
            if cols.len() < 8 {
                return None;
            }
            if cols[1] != "00000000" || cols[7] != "00000000" {
                return None;
            }
            Some(DefaultRoute {
                interface: cols[0].to_string(),
                metric: cols[6].parse().ok()?,
            })
        })
        .collect()
}

/// Interfaces plus routes → (active network, listed networks) for the monitor.
pub fn to_networks(
    interfaces: &[Interface],
    routes: &[DefaultRoute],
) -> (Option<NetworkId>, Vec<(NetworkId, Option<Capabilities>)>) {
    let active = routes
        .iter()
        .filter_map(|r| {
            let i = interfaces.iter().find(|i| i.up && i.name == r.interface)?;
            Some((r.metric, i.index))
        })
        .min_by_key(|&(metric, _)| metric)
        .map(|(_, index)| NetworkId(index));

    let networks = interfaces
        .iter()
        .filter(|i| i.up)
        .map(|i| {
            let routed = routes.iter().any(|r| r.interface == i.name);
            let caps = Capabilities {
                has_internet: routed,
                validated: routed,
                metered: i.transport == TransportKind::Cellular,
                restricted: false,
                suspended: false,
                trusted: true,
                roaming: false,
                transport: i.transport,
                bandwidth_kbps: i.speed_mbps.unwrap_or(0).saturating_mul(1000),
                interface: Some(i.name.clone()),
            };
            (NetworkId(i.index), Some(caps))
        })
        .collect();
    (active, networks)
}

/// One poll: read both sources and push the result into `monitor`.
pub fn refresh(monitor: &NetworkMonitor, paths: &SysfsPaths) -> std::io::Result<()> {
    let interfaces = read_interfaces(&paths.class_net)?;
    // A missing route table (containers) means no default route.
    let routes = fs::read_to_string(&paths.proc_route)
        .map(|c| parse_default_routes(&c))
        .unwrap_or_default();
    let (active, networks) = to_networks(&interfaces, &routes);
    monitor.replace_all(active, networks);
    Ok(())
}

/// Poll every `interval` until `cancel` fires. The first refresh happens before
/// returning so the monitor is populated for the resolver's initial snapshot.
pub async fn spawn_poller(
    monitor: Arc<NetworkMonitor>,
    paths: SysfsPaths,
    interval: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    poll_once(&monitor, &paths).await;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = ticker.tick() => poll_once(&monitor, &paths).await,
            }
        }
    })
}

async fn poll_once(monitor: &Arc<NetworkMonitor>, paths: &SysfsPaths) {
    let m = Arc::clone(monitor);
    let p = paths.clone();
    match tokio::task::spawn_blocking(move || refresh(&m, &p)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!("network poll failed: {}", e),
        Err(e) => tracing::warn!("network poll task failed: {}", e),
    }
}
