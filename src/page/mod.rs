//! Page identifiers: filtering, natural ordering and cover selection
//!
//! A page identifier is the name of one image inside a container. Identifiers
//! are never persisted, so everything here is a pure function of the names a
//! container reports.

mod cover;
mod natural;

pub use cover::select_cover;
pub use natural::natural_cmp;

/// Recognized page image suffixes (compared case-insensitively)
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "avif", "gif"];

/// Returns the final component of a page identifier
///
/// Archive entries may carry folder prefixes using either separator.
pub fn base_name(page: &str) -> &str {
    page.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(page)
}

/// Checks whether a page identifier names a visible, recognized image
pub fn is_page_name(page: &str) -> bool {
    let base = base_name(page);
    if base.is_empty() || base.starts_with('.') {
        return false;
    }

    match base.rsplit_once('.') {
        Some((_, ext)) => IMAGE_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known)),
        None => false,
    }
}

/// Filters raw entry names down to pages and sorts them in natural order
pub fn collect_pages<I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut pages: Vec<String> = names.into_iter().filter(|n| is_page_name(n)).collect();
    // Stable sort keeps the container's order for names that compare equal
    pages.sort_by(|a, b| natural_cmp(a, b));
    pages
}

/// Returns the media type served for a page, based on its extension
pub fn content_type_for(page: &str) -> &'static str {
    let ext = base_name(page)
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "avif" => "image/avif",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_page_name() {
        assert!(is_page_name("001.jpg"));
        assert!(is_page_name("Cover.JPEG"));
        assert!(is_page_name("scans/page.webp"));
        assert!(is_page_name("x.avif"));
        assert!(is_page_name("anim.GIF"));

        assert!(!is_page_name(".hidden.jpg"));
        assert!(!is_page_name("__MACOSX/.001.jpg"));
        assert!(!is_page_name("ComicInfo.xml"));
        assert!(!is_page_name("jpg"));
        assert!(!is_page_name("folder/"));
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("a/b/c.png"), "c.png");
        assert_eq!(base_name("a\\b.png"), "b.png");
        assert_eq!(base_name("plain.png"), "plain.png");
    }

    #[test]
    fn test_collect_pages_filters_and_orders() {
        let names = vec![
            "page10.jpg".to_string(),
            "notes.txt".to_string(),
            "page2.jpg".to_string(),
            ".page1.jpg".to_string(),
            "page1.png".to_string(),
        ];

        assert_eq!(
            collect_pages(names),
            vec!["page1.png", "page2.jpg", "page10.jpg"]
        );
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("a.png"), "image/png");
        assert_eq!(content_type_for("a.WEBP"), "image/webp");
        assert_eq!(content_type_for("a.gif"), "image/gif");
        assert_eq!(content_type_for("a.avif"), "image/avif");
        assert_eq!(content_type_for("a.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("a"), "image/jpeg");
    }
}
