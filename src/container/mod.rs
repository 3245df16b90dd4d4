//! Container adapter over the three kinds of library items
//!
//! A container is either a `.cbz` (zip) archive, a `.cbr` (rar) archive, or a
//! plain directory of images. Its kind is resolved once, at discovery time or
//! when a read path opens it, and every operation dispatches on that tag.
//! All kinds share the same page filtering and natural ordering.

mod directory;
mod rar_archive;
mod zip_archive;

use crate::page::{collect_pages, content_type_for, is_page_name};
use crate::{ContainerError, ContainerResult};
use image::DynamicImage;
use std::fs::FileType;
use std::path::{Path, PathBuf};

/// The closed set of container kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// Zip-based comic archive (`.cbz`)
    Zip,
    /// Rar-based comic archive (`.cbr`), read sequentially
    Rar,
    /// Folder whose direct children are page images
    Directory,
}

impl ContainerKind {
    /// Resolves an archive kind from a file extension, case-insensitively
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("cbz") {
            Some(Self::Zip)
        } else if ext.eq_ignore_ascii_case("cbr") {
            Some(Self::Rar)
        } else {
            None
        }
    }

    pub fn is_archive(&self) -> bool {
        matches!(self, Self::Zip | Self::Rar)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Zip => "cbz",
            Self::Rar => "cbr",
            Self::Directory => "directory",
        }
    }
}

/// Raw bytes of one page plus the media type to serve them with
#[derive(Debug, Clone)]
pub struct PageData {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

/// A classified library item
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Container {
    kind: ContainerKind,
    path: PathBuf,
}

impl Container {
    pub fn new(kind: ContainerKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    /// Classifies a filesystem entry found while walking a library root
    ///
    /// Returns `None` for anything that is not a container: non-archive files
    /// and directories holding no recognized images. Symlinks are classified
    /// by their target; dangling links are ignored.
    pub fn classify(path: &Path, file_type: FileType) -> Option<Self> {
        if file_type.is_symlink() {
            let target = std::fs::metadata(path).ok()?;
            return Self::classify(path, target.file_type());
        }

        if file_type.is_dir() {
            return directory::has_pages(path).then(|| Self::new(ContainerKind::Directory, path));
        }

        if file_type.is_file() {
            return ContainerKind::from_extension(path).map(|kind| Self::new(kind, path));
        }

        None
    }

    /// Opens an existing item by path for the read path
    pub fn open(path: &Path) -> ContainerResult<Self> {
        let metadata = std::fs::metadata(path).map_err(|e| ContainerError::Unreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if metadata.is_dir() {
            return Ok(Self::new(ContainerKind::Directory, path));
        }

        ContainerKind::from_extension(path)
            .map(|kind| Self::new(kind, path))
            .ok_or_else(|| ContainerError::UnsupportedKind(path.to_path_buf()))
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the immediate parent directory
    pub fn category(&self) -> String {
        self.path
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Archive file name without extension, or the directory's own name
    pub fn title(&self) -> String {
        let name = match self.kind {
            ContainerKind::Directory => self.path.file_name(),
            ContainerKind::Zip | ContainerKind::Rar => self.path.file_stem(),
        };
        name.map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Lists the page identifiers of this container in natural order
    pub fn list_pages(&self) -> ContainerResult<Vec<String>> {
        let names = match self.kind {
            ContainerKind::Zip => zip_archive::entry_names(&self.path)?,
            ContainerKind::Rar => rar_archive::entry_names(&self.path)?,
            ContainerKind::Directory => directory::entry_names(&self.path)?,
        };
        Ok(collect_pages(names))
    }

    /// Reads the raw bytes of one page
    pub fn read_page(&self, page: &str) -> ContainerResult<PageData> {
        if !is_page_name(page) {
            return Err(self.page_not_found(page));
        }

        let bytes = match self.kind {
            ContainerKind::Zip => zip_archive::read_entry(&self.path, page)?,
            ContainerKind::Rar => rar_archive::read_entry(&self.path, page)?,
            ContainerKind::Directory => directory::read_entry(&self.path, page)?,
        };

        if let Err(e) = image::guess_format(&bytes) {
            return Err(ContainerError::DecodeFailed {
                page: page.to_string(),
                message: e.to_string(),
            });
        }

        Ok(PageData {
            bytes,
            content_type: content_type_for(page),
        })
    }

    /// Reads and decodes one page into an image
    pub fn decode_page(&self, page: &str) -> ContainerResult<DynamicImage> {
        let data = self.read_page(page)?;
        image::load_from_memory(&data.bytes).map_err(|e| ContainerError::DecodeFailed {
            page: page.to_string(),
            message: e.to_string(),
        })
    }

    fn page_not_found(&self, page: &str) -> ContainerError {
        ContainerError::PageNotFound {
            container: self.path.clone(),
            page: page.to_string(),
        }
    }
}

fn unreadable(path: &Path, err: impl std::fmt::Display) -> ContainerError {
    ContainerError::Unreadable {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
