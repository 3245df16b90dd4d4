//! Integration tests for scan passes
//!
//! These tests build small libraries on disk with tempfile and run full
//! passes against a real SQLite catalog.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use magz::config::parse_config;
use magz::scanner::path_key;
use magz::storage::{lock_store, CatalogStore, CoverRef, EntryDraft};
use magz::thumbnail::DATA_URI_PREFIX;
use magz::{CatalogError, ContainerKind, Library};
use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// Encodes a solid PNG of the given size
fn png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([200, 40, 40]));
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut bytes, ImageFormat::Png)
        .expect("Failed to encode PNG");
    bytes.into_inner()
}

fn write_cbz(path: &Path, pages: &[&str]) {
    let file = File::create(path).expect("Failed to create archive");
    let mut writer = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for page in pages {
        writer.start_file(*page, options).unwrap();
        writer.write_all(&png(30, 45)).unwrap();
    }
    writer.finish().unwrap();
}

fn write_issue_dir(path: &Path, pages: &[&str]) {
    fs::create_dir_all(path).unwrap();
    for page in pages {
        fs::write(path.join(page), png(30, 45)).unwrap();
    }
}

/// A library root plus the catalog database living beside it
struct Fixture {
    _dir: TempDir,
    root: PathBuf,
    db: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let root = dir.path().join("Comics");
        fs::create_dir_all(&root).unwrap();
        let root = root.canonicalize().unwrap();
        let db = dir.path().join("cache.db");
        Self {
            _dir: dir,
            root,
            db,
        }
    }

    fn library(&self) -> Library {
        let toml = format!(
            r#"
[library]
roots = ["{}"]

[scan]
workers = 4
thumbnail-permits = 2
queue-capacity = 3

[thumbnail]
max-dimension = 64

[cache]
database-path = "{}"
"#,
            escape(&self.root),
            escape(&self.db)
        );
        let config = parse_config(&toml).expect("Failed to parse config");
        Library::open(config, "integration").expect("Failed to open library")
    }
}

fn escape(path: &Path) -> String {
    path.display().to_string().replace('\\', "\\\\")
}

fn entry_for(library: &Library, path: &Path) -> Option<magz::CatalogEntry> {
    let store = lock_store(library.store()).unwrap();
    store.query_by_path(&path_key(path)).unwrap()
}

#[tokio::test]
async fn test_directory_item_end_to_end() {
    let fixture = Fixture::new();
    let issue = fixture.root.join("Batman").join("Batman #1");
    write_issue_dir(&issue, &["001.png", "002.png", "cover.png"]);

    let library = fixture.library();
    let report = library.trigger_scan().await.unwrap();
    assert_eq!((report.created(), report.updated(), report.deleted()), (1, 0, 0));

    let entry = entry_for(&library, &issue).expect("Entry should be cataloged");
    assert_eq!(entry.category, "Batman");
    assert_eq!(entry.title, "Batman #1");
    assert_eq!(entry.cover, CoverRef::Page("cover.png".to_string()));
    assert!(entry.cover_thumbnail.starts_with(DATA_URI_PREFIX));
}

#[tokio::test]
async fn test_archive_item_uses_first_page() {
    let fixture = Fixture::new();
    let series = fixture.root.join("Death to Pachuco");
    fs::create_dir_all(&series).unwrap();
    let archive = series.join("Death to Pachuco 001.cbz");
    write_cbz(&archive, &["page10.png", "page2.png", "page1.png"]);

    let library = fixture.library();
    library.trigger_scan().await.unwrap();

    let entry = entry_for(&library, &archive).expect("Archive should be cataloged");
    assert_eq!(entry.category, "Death to Pachuco");
    assert_eq!(entry.title, "Death to Pachuco 001");
    assert_eq!(entry.cover, CoverRef::ArchiveInternal(ContainerKind::Zip));
    assert!(!entry.cover_thumbnail.is_empty());

    let pages = library.list_pages(&archive).unwrap();
    assert_eq!(pages, vec!["page1.png", "page2.png", "page10.png"]);
}

#[tokio::test]
async fn test_second_pass_is_idempotent() {
    let fixture = Fixture::new();
    write_issue_dir(&fixture.root.join("Mad").join("Mad 12"), &["01.png"]);
    write_cbz(&fixture.root.join("Mad").join("Mad 13.cbz"), &["01.png"]);

    let library = fixture.library();
    let first = library.trigger_scan().await.unwrap();
    assert_eq!(first.created(), 2);

    let updated_before: Vec<String> = library
        .entries()
        .unwrap()
        .into_iter()
        .map(|e| e.updated_at)
        .collect();

    let second = library.trigger_scan().await.unwrap();
    assert_eq!((second.created(), second.updated(), second.deleted()), (0, 0, 0));

    let updated_after: Vec<String> = library
        .entries()
        .unwrap()
        .into_iter()
        .map(|e| e.updated_at)
        .collect();
    assert_eq!(updated_before, updated_after);
}

#[tokio::test]
async fn test_removed_file_is_tombstoned() {
    let fixture = Fixture::new();
    let keep = fixture.root.join("Mad").join("Mad 1.cbz");
    let gone = fixture.root.join("Mad").join("Mad 2.cbz");
    fs::create_dir_all(fixture.root.join("Mad")).unwrap();
    write_cbz(&keep, &["01.png"]);
    write_cbz(&gone, &["01.png"]);

    let library = fixture.library();
    library.trigger_scan().await.unwrap();

    fs::remove_file(&gone).unwrap();
    let report = library.trigger_scan().await.unwrap();
    assert_eq!(report.deleted(), 1);
    assert_eq!(report.created() + report.updated(), 0);

    let remaining = lock_store(library.store()).unwrap().list_all().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].0, path_key(&keep));
}

#[tokio::test]
async fn test_touched_file_is_updated_once() {
    let fixture = Fixture::new();
    let archive = fixture.root.join("Annual 1999.cbz");
    write_cbz(&archive, &["cover.png", "01.png"]);

    let library = fixture.library();
    library.trigger_scan().await.unwrap();

    // Wipe the thumbnail so regeneration is observable
    let id = entry_for(&library, &archive).unwrap().id;
    lock_store(library.store())
        .unwrap()
        .set_thumbnail(id, "")
        .unwrap();

    let later = SystemTime::now() + Duration::from_secs(120);
    File::options()
        .write(true)
        .open(&archive)
        .unwrap()
        .set_modified(later)
        .unwrap();

    let report = library.trigger_scan().await.unwrap();
    assert_eq!((report.created(), report.updated(), report.deleted()), (0, 1, 0));

    let entry = entry_for(&library, &archive).unwrap();
    assert_eq!(entry.id, id);
    assert!(entry.cover_thumbnail.starts_with(DATA_URI_PREFIX));

    let again = library.trigger_scan().await.unwrap();
    assert!(again.is_noop());
}

#[tokio::test]
async fn test_non_containers_are_ignored() {
    let fixture = Fixture::new();
    fs::write(fixture.root.join("readme.txt"), b"hello").unwrap();
    fs::create_dir_all(fixture.root.join("Empty Series")).unwrap();
    fs::create_dir_all(fixture.root.join("Hidden")).unwrap();
    fs::write(fixture.root.join("Hidden").join(".01.png"), png(4, 4)).unwrap();

    let library = fixture.library();
    let report = library.trigger_scan().await.unwrap();
    assert!(report.is_noop());
    assert!(library.entries().unwrap().is_empty());
}

#[tokio::test]
async fn test_read_path_is_guarded() {
    let fixture = Fixture::new();
    let issue = fixture.root.join("Batman").join("Batman #2");
    write_issue_dir(&issue, &["01.png"]);
    let library = fixture.library();

    let page = library.read_page(&issue, "01.png").unwrap();
    assert_eq!(page.content_type, "image/png");

    let traversal = fixture.root.join("..").join("cache.db");
    assert!(matches!(
        library.list_pages(&traversal),
        Err(CatalogError::Unauthorized { .. })
    ));
    assert!(matches!(
        library.read_page(Path::new("/etc"), "passwd.png"),
        Err(CatalogError::Unauthorized { .. })
    ));
}

#[tokio::test]
async fn test_listing_backfills_missing_thumbnail() {
    let fixture = Fixture::new();
    let issue = fixture.root.join("Batman").join("Batman #3");
    write_issue_dir(&issue, &["01.png", "02.png"]);
    let library = fixture.library();

    let id = lock_store(library.store())
        .unwrap()
        .upsert(&EntryDraft {
            path: path_key(&issue),
            category: "Batman".to_string(),
            title: "Batman #3".to_string(),
            cover: CoverRef::Page("01.png".to_string()),
            cover_thumbnail: String::new(),
            last_modified: "2000-01-01T00:00:00Z".to_string(),
        })
        .unwrap();

    let listed = library.entries().unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].cover_thumbnail.is_empty());

    let mut filled = String::new();
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        filled = library.entry(id).unwrap().cover_thumbnail;
        if !filled.is_empty() {
            break;
        }
    }
    assert!(filled.starts_with(DATA_URI_PREFIX));
}

#[tokio::test]
async fn test_scan_runs_are_recorded() {
    let fixture = Fixture::new();
    write_issue_dir(&fixture.root.join("X").join("X 1"), &["01.png"]);
    let library = fixture.library();

    let report = library.trigger_scan().await.unwrap();
    let run = lock_store(library.store())
        .unwrap()
        .latest_scan_run()
        .unwrap()
        .expect("Run should be recorded");
    assert_eq!(run.id, report.run_id);
    assert_eq!(run.config_hash, "integration");
    assert_eq!(run.counts, report.counts);
    assert!(run.finished_at.is_some());
}
