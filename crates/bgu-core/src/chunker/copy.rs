//! Concurrent range copies on the blocking pool.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;

use super::error::ChunkError;
use super::range::{plan_chunks, Chunk, ChunkSpec};
use crate::control::AbortSignal;

/// Copy each chunk of `source` into its own file.
///
/// Every spec is validated before any file is opened; an invalid spec fails
/// the call with nothing written. Copies then run concurrently; the first
/// failure stops the others and is returned.
pub async fn chunk_file(source: &Path, specs: &[ChunkSpec], buffer_size: usize) -> Result<(), ChunkError> {
    let chunks = specs
        .iter()
        .enumerate()
        .map(|(i, s)| Chunk::from_spec(i, s))
        .collect::<Result<Vec<_>, _>>()?;
    copy_all(source, chunks, buffer_size).await
}

/// Split `source` into `count` equal chunks under `dir` (created if missing);
/// returns the specs that were written.
pub async fn split_file(
    source: &Path,
    dir: &Path,
    count: usize,
    buffer_size: usize,
) -> Result<Vec<ChunkSpec>, ChunkError> {
    let total = tokio::fs::metadata(source)
        .await
        .map_err(|e| ChunkError::io(source, e))?
        .len();
    let chunks = plan_chunks(total, count, dir)?;
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ChunkError::io(dir, e))?;
    let specs = chunks.iter().map(ChunkSpec::from).collect();
    copy_all(source, chunks, buffer_size).await?;
    Ok(specs)
}

async fn copy_all(source: &Path, chunks: Vec<Chunk>, buffer_size: usize) -> Result<(), ChunkError> {
    let source: Arc<PathBuf> = Arc::new(source.to_path_buf());
    let abort = AbortSignal::new();
    let buffer_size = buffer_size.max(1);

    let mut set = JoinSet::new();
    for chunk in chunks {
        let source = Arc::clone(&source);
        let abort = abort.clone();
        set.spawn_blocking(move || copy_range(&source, &chunk, buffer_size, &abort));
    }

    let mut first_err: Option<ChunkError> = None;
    while let Some(joined) = set.join_next().await {
        let result = joined.unwrap_or_else(|e| Err(ChunkError::Task(e.to_string())));
        if let Err(e) = result {
            if first_err.is_none() {
                tracing::debug!("chunk copy failed, aborting batch: {}", e);
                abort.abort();
                first_err = Some(e);
            }
        }
    }
    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Copy one range. Stops early (without error) once `abort` is raised; the
/// batch already has an error to report.
fn copy_range(source: &Path, chunk: &Chunk, buffer_size: usize, abort: &AbortSignal) -> Result<(), ChunkError> {
    let mut input = File::open(source).map_err(|e| ChunkError::io(source, e))?;
    input
        .seek(SeekFrom::Start(chunk.position))
        .map_err(|e| ChunkError::io(source, e))?;
    let mut output = File::create(&chunk.path).map_err(|e| ChunkError::io(&chunk.path, e))?;

    let mut buf = vec![0u8; buffer_size];
    let mut copied = 0u64;
    while copied < chunk.size {
        if abort.is_aborted() {
            return Ok(());
        }
        let want = (chunk.size - copied).min(buf.len() as u64) as usize;
        let n = match input.read(&mut buf[..want]) {
            Ok(0) => {
                return Err(ChunkError::ShortSource {
                    path: chunk.path.clone(),
                    expected: chunk.size,
                    copied,
                })
            }
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ChunkError::io(source, e)),
        };
        output
            .write_all(&buf[..n])
            .map_err(|e| ChunkError::io(&chunk.path, e))?;
        copied += n as u64;
    }
    output.flush().map_err(|e| ChunkError::io(&chunk.path, e))?;
    Ok(())
}
