//! Structured logging for the orchestrator.
//!
//! The CLI prints upload events on stdout, so diagnostics go to a log file in
//! the XDG state dir (`~/.local/state/bgu/bgu.log`). `RUST_LOG` overrides the
//! default filter.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,bgu=debug,bgu_core=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Per-event handle on the shared log file. A failed `try_clone` degrades to
/// stderr for that event instead of dropping it.
enum LogWriter {
    File(File),
    Stderr(io::Stderr),
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogWriter::File(f) => f.write(buf),
            LogWriter::Stderr(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogWriter::File(f) => f.flush(),
            LogWriter::Stderr(s) => s.flush(),
        }
    }
}

struct AppendLog(File);

impl AppendLog {
    fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open {}", path.display()))?;
        Ok(Self(file))
    }
}

impl<'a> MakeWriter<'a> for AppendLog {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        match self.0.try_clone() {
            Ok(f) => LogWriter::File(f),
            Err(_) => LogWriter::Stderr(io::stderr()),
        }
    }
}

/// `~/.local/state/bgu/bgu.log`.
pub fn log_file_path() -> Result<PathBuf> {
    let dirs = xdg::BaseDirectories::with_prefix("bgu")?;
    Ok(dirs.get_state_home().join("bgu.log"))
}

/// Install the global subscriber writing to [`log_file_path`]. Errors (state
/// dir unwritable, subscriber already set) are returned so the caller can fall
/// back to [`init_logging_stderr`].
pub fn init_logging() -> Result<()> {
    let path = log_file_path()?;
    let log = AppendLog::open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(log)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install subscriber: {}", e))?;

    tracing::info!(path = %path.display(), "logging initialized");
    Ok(())
}

/// Stderr-only logging. Never fails; a second call is a no-op.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .with_ansi(false)
        .try_init();
}
