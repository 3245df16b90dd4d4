use crate::container::unreadable;
use crate::page::is_page_name;
use crate::{ContainerError, ContainerResult};
use std::io::ErrorKind;
use std::path::Path;

/// File names of the direct, non-directory children of `path`
pub(super) fn entry_names(path: &Path) -> ContainerResult<Vec<String>> {
    let entries = std::fs::read_dir(path).map_err(|e| unreadable(path, e))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| unreadable(path, e))?;
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(true) {
            continue;
        }
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

/// Cheap discovery check: does the folder hold at least one page?
pub(super) fn has_pages(path: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(path) else {
        return false;
    };

    entries.flatten().any(|entry| {
        !entry.file_type().map(|t| t.is_dir()).unwrap_or(true)
            && is_page_name(&entry.file_name().to_string_lossy())
    })
}

pub(super) fn read_entry(path: &Path, page: &str) -> ContainerResult<Vec<u8>> {
    // Directory page identifiers are bare file names
    if page.contains(|c: char| c == '/' || c == '\\') {
        return Err(not_found(path, page));
    }

    std::fs::read(path.join(page)).map_err(|e| match e.kind() {
        ErrorKind::NotFound => not_found(path, page),
        _ => unreadable(path, e),
    })
}

fn not_found(path: &Path, page: &str) -> ContainerError {
    ContainerError::PageNotFound {
        container: path.to_path_buf(),
        page: page.to_string(),
    }
}
