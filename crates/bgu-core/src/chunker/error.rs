use std::path::PathBuf;

/// Errors from chunk validation or copying.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    #[error("chunk {index}: position must be >= 0 (got {position})")]
    InvalidPosition { index: usize, position: i64 },
    #[error("chunk {index}: size must be > 0 (got {size})")]
    InvalidSize { index: usize, size: i64 },
    #[error("cannot split {total} bytes into {chunks} chunks")]
    InvalidCount { chunks: usize, total: u64 },
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("source ended after {copied} of {expected} bytes for {}", path.display())]
    ShortSource {
        path: PathBuf,
        expected: u64,
        copied: u64,
    },
    #[error("chunk task failed: {0}")]
    Task(String),
}

impl ChunkError {
    pub(super) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ChunkError::Io {
            path: path.into(),
            source,
        }
    }
}
