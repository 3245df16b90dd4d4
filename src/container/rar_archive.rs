//! Rar archives offer no random access: reading a page reopens the archive
//! and walks headers until the named entry or the end.

use crate::container::unreadable;
use crate::{ContainerError, ContainerResult};
use std::path::Path;
use unrar::Archive;

pub(super) fn entry_names(path: &Path) -> ContainerResult<Vec<String>> {
    let listing = Archive::new(path)
        .open_for_listing()
        .map_err(|e| unreadable(path, e))?;

    let mut names = Vec::new();
    for header in listing {
        let header = header.map_err(|e| unreadable(path, e))?;
        if header.is_directory() {
            continue;
        }
        names.push(header.filename.to_string_lossy().into_owned());
    }
    Ok(names)
}

pub(super) fn read_entry(path: &Path, page: &str) -> ContainerResult<Vec<u8>> {
    let mut archive = Archive::new(path)
        .open_for_processing()
        .map_err(|e| unreadable(path, e))?;

    while let Some(header) = archive.read_header().map_err(|e| unreadable(path, e))? {
        if header.entry().filename.to_string_lossy() == page {
            let (bytes, _) = header.read().map_err(|e| unreadable(path, e))?;
            return Ok(bytes);
        }
        archive = header.skip().map_err(|e| unreadable(path, e))?;
    }

    Err(ContainerError::PageNotFound {
        container: path.to_path_buf(),
        page: page.to_string(),
    })
}
