//! Background upload orchestrator.
//!
//! Uploads files to HTTP endpoints one job at a time (or a few, see
//! `max_concurrent_transfers`), following the best available network, retrying
//! transient failures and reporting one aggregate progress figure.

pub mod chunker;
pub mod config;
pub mod control;
pub mod events;
pub mod job;
pub mod logging;
pub mod network;
pub mod progress;
pub mod retry;
pub mod scheduler;
pub mod transport;

pub use scheduler::{Uploader, UploaderBuilder};
