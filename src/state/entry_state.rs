/// Item change detection for scan passes
///
/// An entry is either absent from the catalog or cataloged. A pass moves it
/// `Absent -> Cataloged` when first seen, keeps it cataloged (refreshing it
/// when its modification time moved), and the tombstone sweep moves it back
/// to absent when a pass never sees it.
use std::fmt;

/// How an item on disk relates to the snapshot taken at pass start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemChange {
    /// Path was not in the catalog
    New,
    /// Path was cataloged with a different modification time
    Updated,
    /// Path was cataloged with the same modification time
    Unchanged,
}

impl ItemChange {
    /// Classifies an item from its recorded and current modification times
    pub fn classify(recorded: Option<&str>, current: &str) -> Self {
        match recorded {
            None => Self::New,
            Some(previous) if previous != current => Self::Updated,
            Some(_) => Self::Unchanged,
        }
    }

    /// Returns true if the item needs its pages listed and thumbnail rebuilt
    pub fn needs_refresh(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

impl fmt::Display for ItemChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::New => "new",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(ItemChange::classify(None, "t1"), ItemChange::New);
        assert_eq!(ItemChange::classify(Some("t0"), "t1"), ItemChange::Updated);
        assert_eq!(ItemChange::classify(Some("t1"), "t1"), ItemChange::Unchanged);
    }

    #[test]
    fn test_needs_refresh() {
        assert!(ItemChange::New.needs_refresh());
        assert!(ItemChange::Updated.needs_refresh());
        assert!(!ItemChange::Unchanged.needs_refresh());
    }

    #[test]
    fn test_display() {
        assert_eq!(ItemChange::Updated.to_string(), "updated");
    }
}
