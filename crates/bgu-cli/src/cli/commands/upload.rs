//! `bgu upload` – run one upload in-process until it reaches a terminal event.

use anyhow::{bail, Result};
use bgu_core::config::UploaderConfig;
use bgu_core::events::UploadEvent;
use bgu_core::job::{BodyType, JobSpec};
use clap::Args;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use crate::cli::engine::{print_event, Engine};

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Destination HTTP/HTTPS URL.
    #[arg(long)]
    pub url: String,
    /// File to upload.
    #[arg(long)]
    pub path: PathBuf,
    /// Job identifier (generated if omitted).
    #[arg(long)]
    pub id: Option<String>,
    /// HTTP method (default POST).
    #[arg(long)]
    pub method: Option<String>,
    /// Request header, `Name: value`. Repeatable.
    #[arg(short = 'H', long = "header", value_name = "HEADER", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
    /// Send as multipart/form-data with the file under this field.
    #[arg(long)]
    pub field: Option<String>,
    /// Extra multipart field, `key=value`. Repeatable.
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, String)>,
    /// Counted retries before giving up.
    #[arg(long, value_name = "N")]
    pub max_retries: Option<u32>,
    /// Only upload over unmetered Wi-Fi-like networks.
    #[arg(long)]
    pub wifi_only: bool,
}

pub fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| format!("expected 'Name: value', got '{}'", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in '{}'", s));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

pub fn parse_param(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected 'key=value', got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty parameter name in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

impl UploadArgs {
    pub fn into_spec(self) -> JobSpec {
        let multipart = self.field.is_some() || !self.params.is_empty();
        JobSpec {
            id: self.id,
            method: self.method,
            headers: self.headers.into_iter().collect::<HashMap<_, _>>(),
            body_type: if multipart {
                BodyType::Multipart
            } else {
                BodyType::Raw
            },
            field: self.field,
            parameters: (!self.params.is_empty())
                .then(|| self.params.into_iter().collect::<BTreeMap<_, _>>()),
            max_retries: self.max_retries,
            wifi_only: self.wifi_only,
            ..JobSpec::raw(self.url, self.path)
        }
    }
}

pub async fn run_upload(cfg: &UploaderConfig, args: UploadArgs) -> Result<()> {
    let mut engine = Engine::start(cfg).await?;
    let id = engine.uploader.start(args.into_spec())?;
    tracing::info!(job_id = %id, "upload started");

    let mut outcome = None;
    let mut interrupted = false;
    while outcome.is_none() {
        tokio::select! {
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                tracing::info!("interrupted, stopping all uploads");
                engine.uploader.cancel_all();
            }
            event = engine.events.recv() => {
                let Some(event) = event else { break };
                print_event(&event)?;
                if event.is_terminal() && event.job_id() == Some(id.as_str()) {
                    outcome = Some(event);
                }
            }
        }
    }
    engine.shutdown();

    match outcome {
        Some(UploadEvent::Error { error, .. }) => bail!("upload {} failed: {}", id, error),
        Some(UploadEvent::Cancelled { .. }) => bail!("upload {} cancelled", id),
        Some(_) => Ok(()),
        None => bail!("event stream ended before upload {} finished", id),
    }
}
