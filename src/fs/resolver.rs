//! Path resolution: user-typed fragments against the current location.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::location::{normalize, Location};
use super::volumes::{Volume, VolumeProvider};
use crate::error::AgentError;
use crate::Result;

/// Resolves operator input into validated locations.
///
/// Resolution never mutates the caller's location: it returns a brand
/// new `Location` (or an error), and the protocol commits it to the
/// session afterwards. Every non-root location returned here has
/// passed an existence, directory-kind, and listability probe.
pub struct PathResolver<V: VolumeProvider> {
    volumes: V,
}

impl<V: VolumeProvider> PathResolver<V> {
    pub fn new(volumes: V) -> Self {
        Self { volumes }
    }

    /// The volume provider, for root listings.
    pub fn provider(&self) -> &V {
        &self.volumes
    }

    /// Resolve `input` relative to `current`.
    ///
    /// Rules, in priority order: a lone separator returns the symbolic
    /// root; volume-style input selects a mounted volume; the parent
    /// token walks up (collapsing to root at a volume root); anything
    /// else is joined or taken absolute, then verified.
    pub fn resolve(&self, current: &Location, input: &str) -> Result<Location> {
        let input = input.trim();
        debug!(current = %current, input, "resolving path input");

        // 1. Lone separator: back to the volume list.
        if input == "/" || input == "\\" {
            return Ok(Location::Root);
        }

        // 2. Volume selection, e.g. "D:" or "E:\".
        if let Some(name) = volume_input(input) {
            let volume = self
                .find_volume(&name)
                .ok_or_else(|| AgentError::VolumeUnavailable(name.clone()))?;
            let root = normalize(&volume.root);
            probe_dir(&root)?;
            return Ok(Location::Dir(root));
        }

        // 3. Parent directory token.
        if input == ".." {
            return match current {
                Location::Root => Ok(Location::Root),
                Location::Dir(path) => {
                    if self.is_volume_root(path) {
                        return Ok(Location::Root);
                    }
                    match path.parent() {
                        None => Ok(Location::Root),
                        Some(parent) => {
                            let parent = normalize(parent);
                            probe_dir(&parent)?;
                            Ok(Location::Dir(parent))
                        }
                    }
                }
            };
        }

        // 4. Absolute input stands alone; relative input needs a volume.
        let candidate = if Path::new(input).is_absolute() {
            normalize(Path::new(input))
        } else {
            match current {
                Location::Root => return Err(AgentError::NoVolumeSelected),
                Location::Dir(path) => normalize(&path.join(input)),
            }
        };

        // 5. The candidate must exist, be a directory, and be listable.
        probe_dir(&candidate)?;
        Ok(Location::Dir(candidate))
    }

    /// Whether `path` is the root of a mounted volume.
    pub fn is_volume_root(&self, path: &Path) -> bool {
        let path = normalize(path);
        self.volumes
            .volumes()
            .iter()
            .any(|v| normalize(&v.root) == path)
    }

    fn find_volume(&self, name: &str) -> Option<Volume> {
        self.volumes
            .volumes()
            .into_iter()
            .find(|v| v.name.eq_ignore_ascii_case(name))
    }
}

/// Parse volume-style input: a drive letter, a colon, and at most
/// trailing separators ("C:", "d:", "E:\"). Longer paths such as
/// "C:\Users" fall through to absolute-path handling.
fn volume_input(input: &str) -> Option<String> {
    let mut chars = input.chars();
    let letter = chars.next()?;
    if !letter.is_ascii_alphabetic() || chars.next()? != ':' {
        return None;
    }
    if !chars.all(|c| c == '/' || c == '\\') {
        return None;
    }
    Some(format!("{}:", letter.to_ascii_uppercase()))
}

/// Existence + directory-kind + listability probe.
fn probe_dir(path: &PathBuf) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|e| classify_io(e, path))?;
    if !metadata.is_dir() {
        return Err(AgentError::NotFound(path.display().to_string()));
    }
    std::fs::read_dir(path).map_err(|e| classify_io(e, path))?;
    Ok(())
}

fn classify_io(err: std::io::Error, path: &Path) -> AgentError {
    match err.kind() {
        std::io::ErrorKind::NotFound => AgentError::NotFound(path.display().to_string()),
        std::io::ErrorKind::PermissionDenied => AgentError::AccessDenied,
        _ => AgentError::Io(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::volumes::VolumeCapacity;
    use tempfile::TempDir;

    /// Fixture provider mapping drive-style names onto temp dirs.
    pub struct FixtureVolumes {
        pub entries: Vec<Volume>,
    }

    impl VolumeProvider for FixtureVolumes {
        fn volumes(&self) -> Vec<Volume> {
            self.entries.clone()
        }

        fn capacity(&self, _volume: &Volume) -> Option<VolumeCapacity> {
            Some(VolumeCapacity {
                free: 1024,
                total: 4096,
            })
        }
    }

    fn fixture() -> (TempDir, PathResolver<FixtureVolumes>) {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("docs")).unwrap();
        std::fs::create_dir(tmp.path().join("docs/projects")).unwrap();
        let provider = FixtureVolumes {
            entries: vec![Volume {
                name: "C:".into(),
                root: tmp.path().to_path_buf(),
            }],
        };
        (tmp, PathResolver::new(provider))
    }

    #[test]
    fn test_lone_separator_returns_root() {
        let (_tmp, resolver) = fixture();
        let loc = resolver
            .resolve(&Location::Dir(PathBuf::from("/anything")), "/")
            .unwrap();
        assert!(loc.is_root());
        let loc = resolver.resolve(&Location::Root, "\\").unwrap();
        assert!(loc.is_root());
    }

    #[test]
    fn test_volume_selection() {
        let (tmp, resolver) = fixture();
        let loc = resolver.resolve(&Location::Root, "C:").unwrap();
        assert_eq!(loc.path(), Some(normalize(tmp.path()).as_path()));
        // Case-insensitive, trailing separator tolerated.
        let loc2 = resolver.resolve(&Location::Root, "c:\\").unwrap();
        assert_eq!(loc, loc2);
    }

    #[test]
    fn test_unknown_volume() {
        let (_tmp, resolver) = fixture();
        let err = resolver.resolve(&Location::Root, "Z:").unwrap_err();
        assert!(matches!(err, AgentError::VolumeUnavailable(name) if name == "Z:"));
    }

    #[test]
    fn test_parent_from_root_stays_root() {
        let (_tmp, resolver) = fixture();
        let loc = resolver.resolve(&Location::Root, "..").unwrap();
        assert!(loc.is_root());
    }

    #[test]
    fn test_parent_at_volume_root_collapses_to_root() {
        let (tmp, resolver) = fixture();
        let at_root = Location::Dir(normalize(tmp.path()));
        let loc = resolver.resolve(&at_root, "..").unwrap();
        assert!(loc.is_root());
    }

    #[test]
    fn test_parent_walks_up() {
        let (tmp, resolver) = fixture();
        let deep = resolver
            .resolve(&Location::Dir(normalize(tmp.path())), "docs/projects")
            .unwrap();
        let up = resolver.resolve(&deep, "..").unwrap();
        assert_eq!(up.path(), Some(normalize(&tmp.path().join("docs")).as_path()));
    }

    #[test]
    fn test_parent_idempotent_once_at_volume_root() {
        let (tmp, resolver) = fixture();
        let mut loc = Location::Dir(normalize(&tmp.path().join("docs")));
        for _ in 0..4 {
            loc = resolver.resolve(&loc, "..").unwrap();
        }
        assert!(loc.is_root());
    }

    #[test]
    fn test_relative_from_root_rejected() {
        let (_tmp, resolver) = fixture();
        let err = resolver.resolve(&Location::Root, "docs").unwrap_err();
        assert!(matches!(err, AgentError::NoVolumeSelected));
    }

    #[test]
    fn test_absolute_from_root_allowed() {
        let (tmp, resolver) = fixture();
        let target = tmp.path().join("docs");
        let loc = resolver
            .resolve(&Location::Root, &target.display().to_string())
            .unwrap();
        assert_eq!(loc.path(), Some(normalize(&target).as_path()));
    }

    #[test]
    fn test_relative_join() {
        let (tmp, resolver) = fixture();
        let base = Location::Dir(normalize(tmp.path()));
        let loc = resolver.resolve(&base, "docs").unwrap();
        assert_eq!(loc.path(), Some(normalize(&tmp.path().join("docs")).as_path()));
    }

    #[test]
    fn test_missing_directory() {
        let (tmp, resolver) = fixture();
        let base = Location::Dir(normalize(tmp.path()));
        let err = resolver.resolve(&base, "nope").unwrap_err();
        assert!(matches!(err, AgentError::NotFound(_)));
    }

    #[test]
    fn test_file_is_not_a_location() {
        let (tmp, resolver) = fixture();
        std::fs::write(tmp.path().join("note.txt"), b"x").unwrap();
        let base = Location::Dir(normalize(tmp.path()));
        let err = resolver.resolve(&base, "note.txt").unwrap_err();
        assert!(matches!(err, AgentError::NotFound(_)));
    }

    #[test]
    fn test_resolve_does_not_mutate_current() {
        let (tmp, resolver) = fixture();
        let base = Location::Dir(normalize(tmp.path()));
        let before = base.clone();
        let _ = resolver.resolve(&base, "docs").unwrap();
        let _ = resolver.resolve(&base, "missing");
        assert_eq!(base, before);
    }

    #[test]
    fn test_returned_location_is_listable() {
        let (tmp, resolver) = fixture();
        let loc = resolver
            .resolve(&Location::Dir(normalize(tmp.path())), "docs")
            .unwrap();
        // The probe contract: a returned location lists successfully.
        assert!(std::fs::read_dir(loc.path().unwrap()).is_ok());
    }

    #[test]
    fn test_volume_input_parsing() {
        assert_eq!(volume_input("C:"), Some("C:".into()));
        assert_eq!(volume_input("d:"), Some("D:".into()));
        assert_eq!(volume_input("E:\\"), Some("E:".into()));
        assert_eq!(volume_input("C:\\Users"), None);
        assert_eq!(volume_input("docs"), None);
        assert_eq!(volume_input(":"), None);
        assert_eq!(volume_input(""), None);
    }
}
