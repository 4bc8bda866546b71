//! `bgu networks` – one sysfs poll, then the snapshot and per-class selection.

use anyhow::Result;
use bgu_core::network::{compute_best, NetworkClass, NetworkMonitor};

pub async fn run_networks() -> Result<()> {
    let monitor = NetworkMonitor::new();
    refresh(&monitor)?;
    let snapshot = monitor.snapshot();

    let best: serde_json::Map<String, serde_json::Value> = NetworkClass::ALL
        .iter()
        .map(|&class| -> Result<(String, serde_json::Value)> {
            let key = serde_json::to_value(class)?
                .as_str()
                .unwrap_or_default()
                .to_string();
            Ok((key, serde_json::to_value(compute_best(class, &snapshot))?))
        })
        .collect::<Result<_>>()?;

    let out = serde_json::json!({ "snapshot": snapshot, "best": best });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

#[cfg(target_os = "linux")]
fn refresh(monitor: &NetworkMonitor) -> Result<()> {
    use bgu_core::network::sysfs;
    sysfs::refresh(monitor, &sysfs::SysfsPaths::default())?;
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn refresh(_monitor: &NetworkMonitor) -> Result<()> {
    anyhow::bail!("no network source on this platform")
}
