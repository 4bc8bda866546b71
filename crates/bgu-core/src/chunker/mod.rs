//! Splitting a file into byte-range pieces.
//!
//! Chunks are validated up front, then copied concurrently on the blocking
//! pool. The first failing chunk aborts the batch. Outputs written by other
//! chunks before the abort are left on disk; cleaning them up is the caller's
//! job.

mod copy;
mod error;
mod range;

pub use copy::{chunk_file, split_file};
pub use error::ChunkError;
pub use range::{plan_chunks, Chunk, ChunkSpec};
