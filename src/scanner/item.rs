//! Per-item work of a scan pass
//!
//! Everything here touches the filesystem and is meant to run on a blocking
//! thread. Failures past the stat step degrade the item instead of failing it.

use crate::container::Container;
use crate::page::select_cover;
use crate::state::{ItemChange, ScanSnapshot};
use crate::storage::{CoverRef, EntryDraft};
use crate::thumbnail::generate_thumbnail;
use chrono::{DateTime, SecondsFormat, Utc};
use std::io;
use std::path::Path;

/// An item that needs its catalog row written
#[derive(Debug, Clone)]
pub struct ItemPlan {
    pub container: Container,
    pub key: String,
    pub change: ItemChange,
    pub last_modified: String,
    pub cover: CoverRef,
    /// Page to render the thumbnail from, if a cover was found
    pub cover_page: Option<String>,
}

impl ItemPlan {
    pub fn into_draft(self, cover_thumbnail: String) -> EntryDraft {
        EntryDraft {
            category: self.container.category(),
            title: self.container.title(),
            path: self.key,
            cover: self.cover,
            cover_thumbnail,
            last_modified: self.last_modified,
        }
    }
}

/// Catalog key of a container
pub fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Modification time of `path` as an RFC 3339 UTC timestamp
pub fn modified_stamp(path: &Path) -> io::Result<String> {
    let modified = std::fs::metadata(path)?.modified()?;
    let modified: DateTime<Utc> = modified.into();
    Ok(modified.to_rfc3339_opts(SecondsFormat::Nanos, true))
}

/// Stats an item and, when new or changed, lists its pages and picks a cover
///
/// Returns `None` when the item is unchanged or cannot be stat'ed.
pub fn plan_item(container: Container, snapshot: &ScanSnapshot) -> Option<ItemPlan> {
    let key = path_key(container.path());

    let last_modified = match modified_stamp(container.path()) {
        Ok(stamp) => stamp,
        Err(e) => {
            tracing::warn!("Cannot stat {}: {}", key, e);
            return None;
        }
    };

    let change = snapshot.change_for(&key, &last_modified);
    if !change.needs_refresh() {
        tracing::trace!("Unchanged: {}", key);
        return None;
    }
    tracing::debug!("{} item: {}", change, key);

    let (cover, cover_page) = match container.list_pages() {
        Ok(pages) => match select_cover(&pages) {
            Some(page) => {
                let page = page.to_string();
                let cover = if container.kind().is_archive() {
                    CoverRef::ArchiveInternal(container.kind())
                } else {
                    CoverRef::Page(page.clone())
                };
                (cover, Some(page))
            }
            None => {
                tracing::warn!("No pages found in {}", key);
                (CoverRef::Missing, None)
            }
        },
        Err(e) => {
            tracing::warn!("Failed to list pages of {}: {}", key, e);
            (CoverRef::Missing, None)
        }
    };

    Some(ItemPlan {
        container,
        key,
        change,
        last_modified,
        cover,
        cover_page,
    })
}

/// Decodes a cover page and renders its thumbnail, or an empty string
pub fn render_cover(container: &Container, page: &str, max_dimension: u32) -> String {
    let image = match container.decode_page(page) {
        Ok(image) => image,
        Err(e) => {
            tracing::warn!("Cannot decode cover of {}: {}", container.path().display(), e);
            return String::new();
        }
    };

    match generate_thumbnail(&image, max_dimension) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::warn!(
                "Thumbnail failed for {}: {}",
                container.path().display(),
                e
            );
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::test_support::{png_bytes, write_zip};
    use crate::container::ContainerKind;
    use crate::thumbnail::DATA_URI_PREFIX;
    use std::fs;
    use tempfile::TempDir;

    fn directory_item(dir: &TempDir) -> Container {
        let issue = dir.path().join("Batman").join("Batman #1");
        fs::create_dir_all(&issue).unwrap();
        for name in ["001.png", "002.png", "cover.png"] {
            fs::write(issue.join(name), png_bytes(20, 30)).unwrap();
        }
        Container::new(ContainerKind::Directory, issue)
    }

    #[test]
    fn test_plan_new_directory() {
        let dir = TempDir::new().unwrap();
        let container = directory_item(&dir);

        let plan = plan_item(container, &ScanSnapshot::default()).unwrap();
        assert_eq!(plan.change, ItemChange::New);
        assert_eq!(plan.cover, CoverRef::Page("cover.png".to_string()));
        assert_eq!(plan.cover_page.as_deref(), Some("cover.png"));

        let draft = plan.into_draft(String::new());
        assert_eq!(draft.category, "Batman");
        assert_eq!(draft.title, "Batman #1");
    }

    #[test]
    fn test_plan_unchanged_is_skipped() {
        let dir = TempDir::new().unwrap();
        let container = directory_item(&dir);
        let key = path_key(container.path());
        let stamp = modified_stamp(container.path()).unwrap();

        let snapshot = ScanSnapshot::new(vec![(key, stamp)]);
        assert!(plan_item(container, &snapshot).is_none());
    }

    #[test]
    fn test_plan_changed_is_update() {
        let dir = TempDir::new().unwrap();
        let container = directory_item(&dir);
        let key = path_key(container.path());

        let snapshot = ScanSnapshot::new(vec![(key, "2001-01-01T00:00:00Z".to_string())]);
        let plan = plan_item(container, &snapshot).unwrap();
        assert_eq!(plan.change, ItemChange::Updated);
    }

    #[test]
    fn test_plan_archive_uses_sentinel() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Death to Pachuco 001.cbz");
        write_zip(&path, &[("b.png", png_bytes(4, 4)), ("a.png", png_bytes(4, 4))]);

        let plan = plan_item(
            Container::new(ContainerKind::Zip, path),
            &ScanSnapshot::default(),
        )
        .unwrap();
        assert_eq!(plan.cover, CoverRef::ArchiveInternal(ContainerKind::Zip));
        assert_eq!(plan.cover_page.as_deref(), Some("a.png"));
    }

    #[test]
    fn test_plan_corrupt_archive_degrades() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.cbz");
        fs::write(&path, b"not a zip").unwrap();

        let plan = plan_item(
            Container::new(ContainerKind::Zip, path),
            &ScanSnapshot::default(),
        )
        .unwrap();
        assert_eq!(plan.cover, CoverRef::Missing);
        assert!(plan.cover_page.is_none());
    }

    #[test]
    fn test_plan_missing_item() {
        let container = Container::new(ContainerKind::Zip, "/no/such/file.cbz");
        assert!(plan_item(container, &ScanSnapshot::default()).is_none());
    }

    #[test]
    fn test_render_cover() {
        let dir = TempDir::new().unwrap();
        let container = directory_item(&dir);

        let uri = render_cover(&container, "cover.png", 60);
        assert!(uri.starts_with(DATA_URI_PREFIX));
        assert!(render_cover(&container, "missing.png", 60).is_empty());
    }
}
