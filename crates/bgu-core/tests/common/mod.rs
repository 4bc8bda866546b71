#![allow(dead_code)]

pub mod scripted_transport;
pub mod upload_server;

use std::sync::Arc;
use std::time::Duration;

use bgu_core::config::UploaderConfig;
use bgu_core::events::{ChannelSink, UploadEvent};
use bgu_core::network::{Capabilities, NetworkId, NetworkMonitor, NetworkResolver, TransportKind};
use tokio::sync::mpsc::UnboundedReceiver;

/// Short delays so scenarios finish in milliseconds.
pub fn fast_config() -> UploaderConfig {
    UploaderConfig {
        retry_delay_secs: 0,
        connectivity_retry_delay_ms: 10,
        progress_interval_ms: 5,
        network_debounce_ms: 10,
        progress_clear_delay_ms: 50,
        ..UploaderConfig::default()
    }
}

pub const WIFI: NetworkId = NetworkId(1);
pub const CELL: NetworkId = NetworkId(2);

pub fn wifi() -> Option<Capabilities> {
    Some(Capabilities::usable(TransportKind::Wifi).with_bandwidth(50_000))
}

pub fn cellular() -> Option<Capabilities> {
    Some(Capabilities::usable(TransportKind::Cellular).with_bandwidth(10_000))
}

/// Monitor + resolver pair; the monitor starts with whatever `setup` adds.
pub fn network(
    cfg: &UploaderConfig,
    setup: impl FnOnce(&NetworkMonitor),
) -> (Arc<NetworkMonitor>, Arc<NetworkResolver>) {
    let monitor = Arc::new(NetworkMonitor::new());
    setup(&monitor);
    let resolver = Arc::new(NetworkResolver::spawn(monitor.subscribe(), cfg.network_debounce()));
    (monitor, resolver)
}

pub fn channel_sink() -> (Arc<ChannelSink>, UnboundedReceiver<UploadEvent>) {
    let (sink, rx) = ChannelSink::new();
    (Arc::new(sink), rx)
}

pub async fn next_event(rx: &mut UnboundedReceiver<UploadEvent>) -> UploadEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("event channel closed")
}

/// Events for `id` up to and including its terminal event.
pub async fn events_until_terminal(rx: &mut UnboundedReceiver<UploadEvent>, id: &str) -> Vec<UploadEvent> {
    let mut out = Vec::new();
    loop {
        let ev = next_event(rx).await;
        if ev.job_id() != Some(id) {
            continue;
        }
        let terminal = ev.is_terminal();
        out.push(ev);
        if terminal {
            return out;
        }
    }
}

/// Poll `f` until it holds or a few seconds pass.
pub async fn eventually(mut f: impl FnMut() -> bool) {
    for _ in 0..500 {
        if f() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

/// Sequence check: zero or more progress events, then exactly one terminal.
pub fn assert_lifecycle(events: &[UploadEvent]) {
    let (last, rest) = events.split_last().expect("no events");
    assert!(last.is_terminal(), "last event must be terminal: {:?}", last);
    for ev in rest {
        assert!(
            matches!(ev, UploadEvent::Progress { .. }),
            "unexpected event before terminal: {:?}",
            ev
        );
    }
}

/// Events per job id, collected until every listed job has had its terminal event.
pub async fn events_until_all_terminal(
    rx: &mut UnboundedReceiver<UploadEvent>,
    ids: &[&str],
) -> std::collections::HashMap<String, Vec<UploadEvent>> {
    let mut out: std::collections::HashMap<String, Vec<UploadEvent>> =
        ids.iter().map(|id| (id.to_string(), Vec::new())).collect();
    let done = |out: &std::collections::HashMap<String, Vec<UploadEvent>>| {
        out.values()
            .all(|evs| evs.last().is_some_and(UploadEvent::is_terminal))
    };
    while !done(&out) {
        let ev = next_event(rx).await;
        if let Some(evs) = ev.job_id().and_then(|id| out.get_mut(id)) {
            evs.push(ev);
        }
    }
    out
}
