//! In-process orchestrator wiring shared by `bgu upload` and `bgu serve`.

use anyhow::Result;
use bgu_core::config::UploaderConfig;
use bgu_core::events::{ChannelSink, KeepAlive, Notice, UploadEvent};
use bgu_core::network::{NetworkMonitor, NetworkResolver};
use bgu_core::transport::CurlTransport;
use bgu_core::Uploader;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;

const NETWORK_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// A terminal has no notification shade; the notice goes to the log.
struct LogKeepAlive;

impl KeepAlive for LogKeepAlive {
    fn declare(&self, notice: &Notice) {
        tracing::trace!(
            title = %notice.title,
            progress = notice.progress,
            connectivity = ?notice.connectivity,
            "keep-alive"
        );
    }
}

pub struct Engine {
    pub uploader: Uploader,
    pub events: UnboundedReceiver<UploadEvent>,
    resolver: Arc<NetworkResolver>,
    stop: CancellationToken,
}

impl Engine {
    /// Network source, resolver and uploader over libcurl.
    pub async fn start(cfg: &UploaderConfig) -> Result<Self> {
        let monitor = Arc::new(NetworkMonitor::new());
        let stop = CancellationToken::new();
        spawn_network_source(Arc::clone(&monitor), stop.clone()).await;

        let resolver = Arc::new(NetworkResolver::spawn(
            monitor.subscribe(),
            cfg.network_debounce(),
        ));
        let (sink, events) = ChannelSink::new();
        let transport = Arc::new(CurlTransport::new(cfg.transport.clone()));
        let uploader = Uploader::builder(cfg.clone(), transport, Arc::clone(&resolver))
            .event_sink(Arc::new(sink))
            .keep_alive(Arc::new(LogKeepAlive))
            .build();
        Ok(Self {
            uploader,
            events,
            resolver,
            stop,
        })
    }

    pub fn shutdown(&self) {
        self.stop.cancel();
        self.resolver.shutdown();
    }
}

#[cfg(target_os = "linux")]
async fn spawn_network_source(monitor: Arc<NetworkMonitor>, stop: CancellationToken) {
    use bgu_core::network::sysfs;
    sysfs::spawn_poller(monitor, sysfs::SysfsPaths::default(), NETWORK_POLL_INTERVAL, stop).await;
}

#[cfg(not(target_os = "linux"))]
async fn spawn_network_source(_monitor: Arc<NetworkMonitor>, _stop: CancellationToken) {
    let _ = NETWORK_POLL_INTERVAL;
    tracing::warn!("no network source on this platform; uploads will wait for a network");
}

/// One event as a JSON line on stdout.
pub fn print_event(event: &UploadEvent) -> Result<()> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}
