//! Per-pass diff state
//!
//! This module defines how an item found on disk compares to what the catalog
//! recorded at the start of a pass, and the ledger a pass fills in while its
//! workers run.

mod entry_state;
mod snapshot;

pub use entry_state::ItemChange;
pub use snapshot::{PassLedger, ScanSnapshot};
