//! CLI for the BGU upload orchestrator.

mod commands;
mod control_socket;
mod engine;

use anyhow::Result;
use clap::{Parser, Subcommand};
use bgu_core::config;
use std::path::PathBuf;

use commands::{
    run_cancel, run_chunk, run_chunk_ranges, run_networks, run_serve, run_start, run_stop_all,
    run_upload, UploadArgs,
};

/// Top-level CLI for the BGU upload orchestrator.
#[derive(Debug, Parser)]
#[command(name = "bgu")]
#[command(about = "BGU: network-aware background file uploads", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Upload one file in-process and print its events as JSON lines.
    Upload(UploadArgs),

    /// Run the orchestrator and accept jobs on the control socket.
    Serve,

    /// Submit a job (JSON file) to a running `bgu serve`.
    Start {
        /// Path to the job JSON.
        job: PathBuf,
    },

    /// Cancel a job on a running `bgu serve`.
    Cancel {
        /// Job identifier.
        id: String,
    },

    /// Cancel every job on a running `bgu serve`.
    StopAll,

    /// Split a file into N equal chunks under DIR (the last takes the remainder).
    Chunk {
        /// Source file.
        source: PathBuf,
        /// Output directory; chunk files are named by index.
        dir: PathBuf,
        /// Number of chunks.
        #[arg(long, value_name = "N")]
        chunks: usize,
    },

    /// Copy explicit byte ranges of a file, as listed in a JSON array of
    /// `{position, size, path}`.
    ChunkRanges {
        /// Source file.
        source: PathBuf,
        /// Path to the chunk spec JSON.
        specs: PathBuf,
    },

    /// Show the visible networks and the best one per network class.
    Networks,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Upload(args) => run_upload(&cfg, args).await?,
            CliCommand::Serve => run_serve(&cfg).await?,
            CliCommand::Start { job } => run_start(&job).await?,
            CliCommand::Cancel { id } => run_cancel(&id).await?,
            CliCommand::StopAll => run_stop_all().await?,
            CliCommand::Chunk {
                source,
                dir,
                chunks,
            } => run_chunk(&cfg, &source, &dir, chunks).await?,
            CliCommand::ChunkRanges { source, specs } => {
                run_chunk_ranges(&cfg, &source, &specs).await?
            }
            CliCommand::Networks => run_networks().await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
