use std::path::{Component, Path, PathBuf};

/// Removes `.` and `..` segments from a path without touching the filesystem
///
/// `..` at the root of an absolute path stays at the root, the same way
/// `/..` resolves to `/` on Unix. Leading `..` segments of a relative path
/// are kept since there is nothing to pop.
///
/// # Examples
///
/// ```
/// use magz::paths::normalize_path;
/// use std::path::Path;
///
/// assert_eq!(normalize_path(Path::new("/lib/../etc/passwd")), Path::new("/etc/passwd"));
/// assert_eq!(normalize_path(Path::new("/lib/./sub/")), Path::new("/lib/sub"));
/// ```
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                Some(Component::ParentDir) | Some(Component::CurDir) | None => {
                    parts.push(component);
                }
            },
            other => parts.push(other),
        }
    }

    parts.iter().map(|c| c.as_os_str()).collect()
}
