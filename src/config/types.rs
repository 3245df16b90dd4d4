use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Magz
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub library: LibraryConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub thumbnail: ThumbnailConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Library roots to catalog
#[derive(Debug, Clone, Deserialize)]
pub struct LibraryConfig {
    /// Ordered list of allowed library roots
    pub roots: Vec<PathBuf>,
}

/// Scan pass tuning
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    /// Number of parallel item workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Maximum simultaneous thumbnail decode/resize/encode operations
    #[serde(rename = "thumbnail-permits", default = "default_thumbnail_permits")]
    pub thumbnail_permits: usize,

    /// Minutes between timer-triggered scan passes
    #[serde(rename = "refresh-interval", default = "default_refresh_interval")]
    pub refresh_interval: u64,

    /// Capacity of the discovery queue feeding the workers
    #[serde(rename = "queue-capacity", default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl ScanConfig {
    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.refresh_interval.saturating_mul(60))
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            thumbnail_permits: default_thumbnail_permits(),
            refresh_interval: default_refresh_interval(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Thumbnail generation settings
#[derive(Debug, Clone, Deserialize)]
pub struct ThumbnailConfig {
    /// Length of the longer thumbnail side, in pixels
    #[serde(rename = "max-dimension", default = "default_max_dimension")]
    pub max_dimension: u32,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_dimension: default_max_dimension(),
        }
    }
}

/// Cache database settings
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_workers() -> usize {
    4
}

fn default_thumbnail_permits() -> usize {
    4
}

fn default_refresh_interval() -> u64 {
    10
}

fn default_queue_capacity() -> usize {
    100
}

fn default_max_dimension() -> u32 {
    400
}

fn default_database_path() -> PathBuf {
    PathBuf::from("magz_cache.db")
}
