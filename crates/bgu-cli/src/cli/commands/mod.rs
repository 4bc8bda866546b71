//! CLI command handlers, one file per command group.

mod chunk;
mod client;
mod networks;
mod serve;
mod upload;

pub use chunk::{run_chunk, run_chunk_ranges};
pub use client::{run_cancel, run_start, run_stop_all};
pub use networks::run_networks;
pub use serve::run_serve;
pub use upload::{run_upload, UploadArgs};

#[cfg(test)]
pub use upload::{parse_header, parse_param};
