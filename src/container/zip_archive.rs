use crate::container::unreadable;
use crate::{ContainerError, ContainerResult};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::result::ZipError;
use zip::ZipArchive;

fn open(path: &Path) -> ContainerResult<ZipArchive<File>> {
    let file = File::open(path).map_err(|e| unreadable(path, e))?;
    ZipArchive::new(file).map_err(|e| unreadable(path, e))
}

/// Lists every entry name from the central directory
/// Upper bound on the buffer reserved from an entry's declared size
const MAX_PREALLOCATION: u64 = 64 << 20;

fn initial_capacity(declared_size: u64) -> usize {
    declared_size.min(MAX_PREALLOCATION) as usize
}

pub(super) fn entry_names(path: &Path) -> ContainerResult<Vec<String>> {
    let archive = open(path)?;
    Ok(archive.file_names().map(str::to_string).collect())
}

/// Reads one entry by exact name
pub(super) fn read_entry(path: &Path, page: &str) -> ContainerResult<Vec<u8>> {
    let mut archive = open(path)?;
    let mut entry = archive.by_name(page).map_err(|e| match e {
        ZipError::FileNotFound => ContainerError::PageNotFound {
            container: path.to_path_buf(),
            page: page.to_string(),
        },
        other => unreadable(path, other),
    })?;

    let mut bytes = Vec::with_capacity(initial_capacity(entry.size()));
    entry
        .read_to_end(&mut bytes)
        .map_err(|e| unreadable(path, e))?;
    Ok(bytes)
}
