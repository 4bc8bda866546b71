use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// libcurl transport parameters (optional `[transport]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Hard ceiling for one request. Large uploads can take hours; worst case the
    /// attempt fails and is retried from byte 0.
    pub request_timeout_secs: u64,
    /// Follow 3xx redirects.
    pub follow_redirects: bool,
    /// Abort if throughput stays below this many bytes/s for `low_speed_time_secs`.
    pub low_speed_limit_bytes: u32,
    pub low_speed_time_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 15,
            request_timeout_secs: 24 * 60 * 60,
            follow_redirects: true,
            low_speed_limit_bytes: 1,
            low_speed_time_secs: 120,
        }
    }
}

impl TransportConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn low_speed_time(&self) -> Duration {
        Duration::from_secs(self.low_speed_time_secs)
    }
}

/// Global configuration loaded from `~/.config/bgu/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploaderConfig {
    /// Number of transfers allowed on the wire at once, across all jobs and classes.
    pub max_concurrent_transfers: usize,
    /// Counted-retry budget for jobs that do not set `max_retries`.
    pub default_max_retries: u32,
    /// Fixed delay between retries (linear, not exponential).
    pub retry_delay_secs: u64,
    /// Delay before re-evaluating a job whose network is unusable at failure time.
    pub connectivity_retry_delay_ms: u64,
    /// Minimum spacing of progress updates per job.
    pub progress_interval_ms: u64,
    /// Quiet window applied to network changes before a new best network is published.
    pub network_debounce_ms: u64,
    /// Grace delay after a terminal event before aggregate progress is cleared.
    pub progress_clear_delay_ms: u64,
    /// Copy buffer for the file chunker.
    pub chunk_buffer_bytes: usize,
    pub transport: TransportConfig,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            max_concurrent_transfers: 1,
            default_max_retries: 5,
            retry_delay_secs: 10,
            connectivity_retry_delay_ms: 1000,
            progress_interval_ms: 500,
            network_debounce_ms: 1000,
            progress_clear_delay_ms: 2000,
            chunk_buffer_bytes: 128 * 1024,
            transport: TransportConfig::default(),
        }
    }
}

impl UploaderConfig {
    /// Semaphore permits; zero is treated as one.
    pub fn max_concurrent_transfers(&self) -> usize {
        self.max_concurrent_transfers.max(1)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn connectivity_retry_delay(&self) -> Duration {
        Duration::from_millis(self.connectivity_retry_delay_ms)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    pub fn network_debounce(&self) -> Duration {
        Duration::from_millis(self.network_debounce_ms)
    }

    pub fn progress_clear_delay(&self) -> Duration {
        Duration::from_millis(self.progress_clear_delay_ms)
    }

    pub fn chunk_buffer_bytes(&self) -> usize {
        self.chunk_buffer_bytes.max(4096)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("bgu")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<UploaderConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = UploaderConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: UploaderConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
