use crate::paths::normalize_path;
use crate::CatalogError;
use std::path::{Path, PathBuf};

/// Checks whether `requested` lies inside one of the allowed roots
///
/// Both sides are normalized lexically and compared component by component,
/// so `/lib2/x` is not inside `/lib`. A relative request never matches an
/// absolute root. An empty root list allows nothing.
pub fn is_path_allowed<P: AsRef<Path>>(requested: &Path, roots: &[P]) -> bool {
    let requested = normalize_path(requested);
    if requested.as_os_str().is_empty() || requested.starts_with("..") {
        return false;
    }

    roots.iter().any(|root| {
        let root = normalize_path(root.as_ref());
        !root.as_os_str().is_empty() && requested.starts_with(&root)
    })
}

/// Returns the normalized path when allowed, otherwise `Unauthorized`
pub fn authorize<P: AsRef<Path>>(requested: &Path, roots: &[P]) -> Result<PathBuf, CatalogError> {
    if is_path_allowed(requested, roots) {
        Ok(normalize_path(requested))
    } else {
        Err(CatalogError::Unauthorized {
            path: requested.to_path_buf(),
        })
    }
}
