//! Magz: an incremental catalog for comic and magazine libraries
//!
//! This crate walks library roots made of image directories and comic
//! archives (`.cbz`, `.cbr`), keeps a SQLite catalog of every item in sync
//! with the filesystem, and generates embeddable cover thumbnails.

pub mod config;
pub mod container;
pub mod library;
pub mod output;
pub mod page;
pub mod paths;
pub mod scanner;
pub mod state;
pub mod storage;
pub mod thumbnail;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for catalog operations
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Container error: {0}")]
    Container(#[from] ContainerError),

    #[error("Thumbnail error: {0}")]
    Thumbnail(#[from] ThumbnailError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Cache store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Path outside configured libraries: {}", path.display())]
    Unauthorized { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Worker task failed: {0}")]
    Task(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Library path does not exist: {}", .0.display())]
    MissingRoot(PathBuf),
}

/// Errors raised while listing or reading pages of a container
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Cannot read container {}: {message}", path.display())]
    Unreadable { path: PathBuf, message: String },

    #[error("Page '{page}' not found in {}", container.display())]
    PageNotFound { container: PathBuf, page: String },

    #[error("Failed to decode page '{page}': {message}")]
    DecodeFailed { page: String, message: String },

    #[error("Not a supported container: {}", .0.display())]
    UnsupportedKind(PathBuf),
}

/// Errors raised by the thumbnail pipeline
#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Failed to encode thumbnail: {0}")]
    EncodeFailed(String),
}

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for container operations
pub type ContainerResult<T> = std::result::Result<T, ContainerError>;

// Re-export commonly used types
pub use config::Config;
pub use container::{Container, ContainerKind};
pub use library::Library;
pub use scanner::ScanReport;
pub use storage::{CatalogEntry, CatalogStore, SqliteStore};
