//! Chunk specs and equal-size planning.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::ChunkError;

/// Caller-supplied chunk request: copy `size` bytes at `position` to `path`.
/// Signed so that negative input can be reported instead of wrapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSpec {
    pub position: i64,
    pub size: i64,
    pub path: PathBuf,
}

/// A validated chunk: byte range [position, position + size), size > 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub position: u64,
    pub size: u64,
    pub path: PathBuf,
}

impl Chunk {
    /// Validate spec number `index` of a batch.
    pub fn from_spec(index: usize, spec: &ChunkSpec) -> Result<Self, ChunkError> {
        if spec.position < 0 {
            return Err(ChunkError::InvalidPosition {
                index,
                position: spec.position,
            });
        }
        if spec.size <= 0 {
            return Err(ChunkError::InvalidSize {
                index,
                size: spec.size,
            });
        }
        Ok(Chunk {
            position: spec.position as u64,
            size: spec.size as u64,
            path: spec.path.clone(),
        })
    }

    pub fn end(&self) -> u64 {
        self.position.saturating_add(self.size)
    }
}

impl From<&Chunk> for ChunkSpec {
    fn from(c: &Chunk) -> Self {
        ChunkSpec {
            position: c.position as i64,
            size: c.size as i64,
            path: c.path.clone(),
        }
    }
}

/// Builds `count` chunks covering `total_len` bytes, written to `dir/<index>`.
///
/// Every chunk is `total_len / count` bytes except the last, which absorbs the
/// remainder. Fails if `count` is 0 or larger than `total_len` (a chunk would
/// be empty).
pub fn plan_chunks(total_len: u64, count: usize, dir: &Path) -> Result<Vec<Chunk>, ChunkError> {
    if count == 0 || count as u64 > total_len {
        return Err(ChunkError::InvalidCount {
            chunks: count,
            total: total_len,
        });
    }
    let n = count as u64;
    let base = total_len / n;

    let mut out = Vec::with_capacity(count);
    for i in 0..n {
        let position = base * i;
        let size = if i == n - 1 { total_len - position } else { base };
        out.push(Chunk {
            position,
            size,
            path: dir.join(i.to_string()),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(position: i64, size: i64) -> ChunkSpec {
        ChunkSpec {
            position,
            size,
            path: PathBuf::from("/tmp/x"),
        }
    }

    #[test]
    fn plan_chunks_even() {
        let chunks = plan_chunks(1000, 4, Path::new("/out")).unwrap();
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[1].position, 250);
        assert_eq!(chunks[3].size, 250);
        assert_eq!(chunks[2].path, PathBuf::from("/out/2"));
    }

    #[test]
    fn plan_chunks_last_absorbs_remainder() {
        let chunks = plan_chunks(10, 4, Path::new("/out")).unwrap();
        let ranges: Vec<(u64, u64)> = chunks.iter().map(|c| (c.position, c.size)).collect();
        assert_eq!(ranges, vec![(0, 2), (2, 2), (4, 2), (6, 4)]);
        assert_eq!(chunks.last().unwrap().end(), 10);
    }

    #[test]
    fn plan_chunks_rejects_empty_chunks() {
        assert!(matches!(
            plan_chunks(100, 0, Path::new("/out")),
            Err(ChunkError::InvalidCount { chunks: 0, total: 100 })
        ));
        assert!(plan_chunks(3, 4, Path::new("/out")).is_err());
        assert!(plan_chunks(0, 1, Path::new("/out")).is_err());
        assert_eq!(plan_chunks(4, 4, Path::new("/out")).unwrap().len(), 4);
    }

    #[test]
    fn spec_validation() {
        assert!(Chunk::from_spec(0, &spec(0, 1)).is_ok());
        assert!(matches!(
            Chunk::from_spec(2, &spec(-1, 4)),
            Err(ChunkError::InvalidPosition { index: 2, position: -1 })
        ));
        assert!(matches!(
            Chunk::from_spec(1, &spec(0, 0)),
            Err(ChunkError::InvalidSize { index: 1, size: 0 })
        ));
        assert!(Chunk::from_spec(0, &spec(0, -5)).is_err());
    }

    #[test]
    fn spec_deserializes_from_json() {
        let specs: Vec<ChunkSpec> =
            serde_json::from_str(r#"[{"position":0,"size":4,"path":"/tmp/a"}]"#).unwrap();
        assert_eq!(specs[0].size, 4);
    }
}
