//! `bgu chunk` and `bgu chunk-ranges`.

use anyhow::{Context, Result};
use bgu_core::chunker::{self, ChunkSpec};
use bgu_core::config::UploaderConfig;
use std::path::Path;

pub async fn run_chunk(cfg: &UploaderConfig, source: &Path, dir: &Path, chunks: usize) -> Result<()> {
    let specs = chunker::split_file(source, dir, chunks, cfg.chunk_buffer_bytes()).await?;
    println!("{}", serde_json::to_string_pretty(&specs)?);
    Ok(())
}

pub async fn run_chunk_ranges(cfg: &UploaderConfig, source: &Path, specs: &Path) -> Result<()> {
    let raw = tokio::fs::read_to_string(specs)
        .await
        .with_context(|| format!("read {}", specs.display()))?;
    let specs: Vec<ChunkSpec> = serde_json::from_str(&raw)?;
    chunker::chunk_file(source, &specs, cfg.chunk_buffer_bytes()).await?;
    println!("Wrote {} chunk(s)", specs.len());
    Ok(())
}
