//! `bgu start`, `bgu cancel`, `bgu stop-all`: talk to a running `bgu serve`.

use anyhow::{Context, Result};
use bgu_core::control::default_control_socket_path;
use bgu_core::job::JobSpec;
use std::path::Path;

use crate::cli::control_socket;

async fn send(line: &str) -> Result<()> {
    let path = default_control_socket_path()?;
    let reply = control_socket::send_command(&path, line).await?;
    println!("{}", reply);
    Ok(())
}

pub async fn run_start(job: &Path) -> Result<()> {
    let raw = tokio::fs::read_to_string(job)
        .await
        .with_context(|| format!("read {}", job.display()))?;
    // Parsed locally so syntax errors point at the file, then re-encoded on one line.
    let spec: JobSpec =
        serde_json::from_str(&raw).with_context(|| format!("parse {}", job.display()))?;
    send(&format!("start {}", serde_json::to_string(&spec)?)).await
}

pub async fn run_cancel(id: &str) -> Result<()> {
    send(&format!("cancel {}", id)).await
}

pub async fn run_stop_all() -> Result<()> {
    send("stop-all").await
}
