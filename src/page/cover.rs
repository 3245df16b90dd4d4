use crate::page::base_name;

/// Picks the page that represents a container in listings
///
/// Priority, first match wins:
/// 1. a page whose file name contains "cover" (any case)
/// 2. a page whose file name starts with "00" or "01"
/// 3. the first page
///
/// `pages` must already be in natural order. Returns `None` when empty.
pub fn select_cover(pages: &[String]) -> Option<&str> {
    pages
        .iter()
        .find(|p| base_name(p).to_lowercase().contains("cover"))
        .or_else(|| {
            pages.iter().find(|p| {
                let base = base_name(p);
                base.starts_with("00") || base.starts_with("01")
            })
        })
        .or_else(|| pages.first())
        .map(String::as_str)
}
