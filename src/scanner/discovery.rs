//! Library walk feeding the scan queue

use crate::container::Container;
use std::path::PathBuf;
use tokio::sync::mpsc::Sender;
use walkdir::WalkDir;

/// Walks every root and classifies each entry found
///
/// Unreadable entries are logged and skipped. Walking continues into the
/// subdirectories of image directories, so nested issues are found too.
/// `emit` returns `false` to stop the walk early.
pub fn walk_roots<F>(roots: &[PathBuf], mut emit: F) -> usize
where
    F: FnMut(Container) -> bool,
{
    let mut discovered = 0;

    for root in roots {
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };

            let Some(container) = Container::classify(entry.path(), entry.file_type()) else {
                continue;
            };

            discovered += 1;
            if !emit(container) {
                tracing::debug!("Scan queue closed, stopping discovery");
                return discovered;
            }
        }
    }

    discovered
}

/// Producer side of a pass: pushes discovered containers onto the queue
///
/// Blocks while the queue is full. Must run off the async runtime.
pub fn discover_into(roots: &[PathBuf], queue: Sender<Container>) -> usize {
    walk_roots(roots, |container| queue.blocking_send(container).is_ok())
}

/// Lists every container under the roots without touching the catalog
pub fn discover_all(roots: &[PathBuf]) -> Vec<Container> {
    let mut found = Vec::new();
    walk_roots(roots, |container| {
        found.push(container);
        true
    });
    found
}
