//! `bgu serve` – orchestrator plus control socket until Ctrl-C.

use anyhow::Result;
use bgu_core::config::UploaderConfig;
use bgu_core::control::default_control_socket_path;
use std::time::Duration;

use crate::cli::control_socket;
use crate::cli::engine::{print_event, Engine};

/// How long Ctrl-C waits for cancelled transfers to report before exiting.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub async fn run_serve(cfg: &UploaderConfig) -> Result<()> {
    let mut engine = Engine::start(cfg).await?;
    let socket_path = default_control_socket_path()?;
    let listener = control_socket::spawn_control_listener(engine.uploader.clone(), &socket_path)?;
    tracing::info!(path = %socket_path.display(), "control socket listening");
    eprintln!("Listening on {}", socket_path.display());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, stopping all uploads");
                engine.uploader.cancel_all();
                break;
            }
            Some(event) = engine.events.recv() => print_event(&event)?,
        }
    }

    let drain = async {
        let idle = engine.uploader.clone();
        let wait = idle.wait_idle();
        tokio::pin!(wait);
        loop {
            tokio::select! {
                _ = &mut wait => break,
                Some(event) = engine.events.recv() => {
                    let _ = print_event(&event);
                }
            }
        }
        while let Ok(event) = engine.events.try_recv() {
            let _ = print_event(&event);
        }
    };
    if tokio::time::timeout(SHUTDOWN_GRACE, drain).await.is_err() {
        tracing::warn!("uploads still running at exit");
    }

    listener.abort();
    let _ = std::fs::remove_file(&socket_path);
    engine.shutdown();
    Ok(())
}
