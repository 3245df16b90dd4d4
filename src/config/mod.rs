//! Configuration module for Magz
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use magz::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("magz.toml")).unwrap();
//! println!("Scanning {} library roots", config.library.roots.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CacheConfig, Config, LibraryConfig, ScanConfig, ThumbnailConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
