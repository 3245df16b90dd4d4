use crate::config::types::{CacheConfig, Config, LibraryConfig, ScanConfig, ThumbnailConfig};
use crate::ConfigError;

const MAX_WORKERS: usize = 64;
/// One week, in minutes
const MAX_REFRESH_INTERVAL: u64 = 7 * 24 * 60;
const MIN_THUMBNAIL_DIMENSION: u32 = 16;
const MAX_THUMBNAIL_DIMENSION: u32 = 4096;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_library_config(&config.library)?;
    validate_scan_config(&config.scan)?;
    validate_thumbnail_config(&config.thumbnail)?;
    validate_cache_config(&config.cache)?;
    Ok(())
}

/// Validates library roots: at least one, each an existing directory
fn validate_library_config(config: &LibraryConfig) -> Result<(), ConfigError> {
    if config.roots.is_empty() {
        return Err(ConfigError::Validation(
            "no library roots specified".to_string(),
        ));
    }

    for root in &config.roots {
        if !root.exists() {
            return Err(ConfigError::MissingRoot(root.clone()));
        }
        if !root.is_dir() {
            return Err(ConfigError::Validation(format!(
                "library root '{}' is not a directory",
                root.display()
            )));
        }
    }

    Ok(())
}

/// Validates worker pool and thumbnail gate sizes
fn validate_scan_config(config: &ScanConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    // The gate never admits more thumbnail jobs than there are workers
    if config.thumbnail_permits < 1 || config.thumbnail_permits > config.workers {
        return Err(ConfigError::Validation(format!(
            "thumbnail-permits must be between 1 and workers ({}), got {}",
            config.workers, config.thumbnail_permits
        )));
    }

    if config.refresh_interval < 1 || config.refresh_interval > MAX_REFRESH_INTERVAL {
        return Err(ConfigError::Validation(format!(
            "refresh-interval must be between 1 and {} minutes, got {}",
            MAX_REFRESH_INTERVAL, config.refresh_interval
        )));
    }

    if config.queue_capacity < 1 {
        return Err(ConfigError::Validation(
            "queue-capacity must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_thumbnail_config(config: &ThumbnailConfig) -> Result<(), ConfigError> {
    if !(MIN_THUMBNAIL_DIMENSION..=MAX_THUMBNAIL_DIMENSION).contains(&config.max_dimension) {
        return Err(ConfigError::Validation(format!(
            "max-dimension must be between {} and {}, got {}",
            MIN_THUMBNAIL_DIMENSION, MAX_THUMBNAIL_DIMENSION, config.max_dimension
        )));
    }
    Ok(())
}

fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.database_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }
    Ok(())
}
