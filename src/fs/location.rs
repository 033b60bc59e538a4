//! Location type and lexical path normalization.

use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A resolved filesystem position.
///
/// `Root` is the symbolic volume-selection state on a drive-letter
/// operating system; it is not a real path. A `Dir` location is a
/// normalized absolute path that existed and was listable at the time
/// it was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Location {
    /// Volume-selection pseudo-location.
    #[default]
    Root,
    /// A verified directory path.
    Dir(PathBuf),
}

impl Location {
    /// Whether this is the volume-selection root.
    pub fn is_root(&self) -> bool {
        matches!(self, Location::Root)
    }

    /// The underlying path, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Location::Root => None,
            Location::Dir(p) => Some(p),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Root => write!(f, "Root"),
            Location::Dir(p) => write!(f, "{}", p.display()),
        }
    }
}

/// Lexically normalize a path: resolve `.` and `..` components without
/// touching the filesystem. `..` at a prefix/root boundary is dropped.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Never pop past a root or drive prefix.
                let popped = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                );
                if popped {
                    out.pop();
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_root() {
        assert!(Location::default().is_root());
        assert!(Location::Root.path().is_none());
    }

    #[test]
    fn test_dir_path() {
        let loc = Location::Dir(PathBuf::from("/tmp/data"));
        assert!(!loc.is_root());
        assert_eq!(loc.path(), Some(Path::new("/tmp/data")));
    }

    #[test]
    fn test_normalize_curdir() {
        assert_eq!(normalize(Path::new("/a/./b/.")), PathBuf::from("/a/b"));
    }

    #[test]
    fn test_normalize_parent() {
        assert_eq!(normalize(Path::new("/a/b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/a/b/..")), PathBuf::from("/a"));
    }

    #[test]
    fn test_normalize_parent_at_root() {
        // Cannot escape above the root.
        assert_eq!(normalize(Path::new("/..")), PathBuf::from("/"));
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Location::Root.to_string(), "Root");
        let loc = Location::Dir(PathBuf::from("/srv"));
        assert_eq!(loc.to_string(), "/srv");
    }
}
