//! Path handling for the read path
//!
//! This module provides:
//! - Lexical normalization of `.` and `..` segments
//! - The authorization guard that keeps caller-supplied paths inside the
//!   configured library roots

mod guard;
mod normalize;

pub use guard::{authorize, is_path_allowed};
pub use normalize::normalize_path;
