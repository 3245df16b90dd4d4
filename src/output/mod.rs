//! Output module for catalog reports
//!
//! This module handles:
//! - Loading catalog statistics from the store
//! - Printing them for the CLI `--stats` mode

pub mod stats;

pub use stats::{load_statistics, print_statistics, render_statistics, LibraryStatistics};
