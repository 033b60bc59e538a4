//! Capability actions over a resolved location.
//!
//! Every operation here except listing the symbolic root requires a
//! selected volume; callers get `NoVolumeSelected` otherwise. Errors
//! are typed and the caller's location is never touched.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use super::entry::{
    DirEntry, EntryKind, ListOutcome, SearchMatch, SearchMatchKind, SearchOutcome, VolumeEntry,
};
use super::location::Location;
use super::volumes::VolumeProvider;
use crate::error::AgentError;
use crate::Result;

/// Transfer-out size ceiling: 50 MiB.
pub const DOWNLOAD_LIMIT: u64 = 50 * 1024 * 1024;

/// Hard cap on search matches; traversal stops here and the result is
/// flagged truncated.
pub const SEARCH_CAP: usize = 1000;

/// A file cleared for transfer-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
}

/// List the current location: mounted volumes from the root, otherwise
/// a parent entry (unless at a volume root), directories sorted by
/// name, then files sorted by name. Per-entry failures degrade that
/// entry instead of aborting the listing.
pub fn list<V: VolumeProvider>(
    location: &Location,
    provider: &V,
    at_volume_root: bool,
) -> Result<ListOutcome> {
    let path = match location {
        Location::Root => {
            let volumes = provider
                .volumes()
                .into_iter()
                .map(|v| {
                    let capacity = provider.capacity(&v);
                    if capacity.is_none() {
                        warn!(volume = %v.name, "capacity probe failed");
                    }
                    VolumeEntry {
                        name: v.name,
                        capacity,
                    }
                })
                .collect();
            return Ok(ListOutcome::Volumes(volumes));
        }
        Location::Dir(path) => path,
    };

    let reader = std::fs::read_dir(path).map_err(|e| classify_io(e, path))?;

    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for item in reader {
        let item = match item {
            Ok(item) => item,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let name = item.file_name().to_string_lossy().into_owned();
        match item.metadata() {
            Ok(meta) if meta.is_dir() => dirs.push(DirEntry {
                name,
                kind: EntryKind::Directory,
            }),
            Ok(meta) => files.push(DirEntry {
                name,
                kind: EntryKind::File {
                    size: meta.len(),
                    modified: meta.modified().ok(),
                },
            }),
            Err(_) => dirs.push(DirEntry {
                name,
                kind: EntryKind::Inaccessible,
            }),
        }
    }

    dirs.sort_by(|a, b| a.name.cmp(&b.name));
    files.sort_by(|a, b| a.name.cmp(&b.name));

    let mut entries = Vec::with_capacity(dirs.len() + files.len() + 1);
    if !at_volume_root {
        entries.push(DirEntry {
            name: "..".into(),
            kind: EntryKind::Parent,
        });
    }
    entries.extend(dirs);
    entries.extend(files);

    Ok(ListOutcome::Directory {
        path: path.clone(),
        entries,
    })
}

/// Create a directory under the current location. Idempotent: an
/// already-existing directory is not an error.
pub fn create_dir(location: &Location, name: &str) -> Result<PathBuf> {
    let base = require_volume(location)?;
    let target = base.join(name);
    std::fs::create_dir_all(&target).map_err(|e| classify_io(e, &target))?;
    debug!(path = %target.display(), "directory created");
    Ok(target)
}

/// What a delete removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deleted {
    File,
    Directory,
}

/// Delete a file (non-recursive) or a directory (recursive,
/// irreversible) under the current location.
pub fn delete(location: &Location, name: &str) -> Result<Deleted> {
    let base = require_volume(location)?;
    let target = base.join(name);
    let metadata = std::fs::symlink_metadata(&target).map_err(|e| classify_io(e, &target))?;
    if metadata.is_dir() {
        std::fs::remove_dir_all(&target).map_err(|e| classify_io(e, &target))?;
        debug!(path = %target.display(), "directory deleted");
        Ok(Deleted::Directory)
    } else {
        std::fs::remove_file(&target).map_err(|e| classify_io(e, &target))?;
        debug!(path = %target.display(), "file deleted");
        Ok(Deleted::File)
    }
}

/// Search names under the current location for a case-insensitive
/// substring match, skipping hidden directories, capped at
/// [`SEARCH_CAP`] matches.
pub fn search(location: &Location, pattern: &str) -> Result<SearchOutcome> {
    let base = require_volume(location)?;
    let needle = pattern.to_lowercase();

    let mut matches = Vec::new();
    let mut truncated = false;

    let walker = WalkDir::new(base)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| !is_hidden_dir(e));

    for item in walker {
        let item = match item {
            Ok(item) => item,
            // Unreadable subtrees are skipped, not fatal.
            Err(_) => continue,
        };
        let name = item.file_name().to_string_lossy();
        if !name.to_lowercase().contains(&needle) {
            continue;
        }

        let relative_path = item
            .path()
            .strip_prefix(base)
            .unwrap_or(item.path())
            .to_path_buf();
        let kind = if item.file_type().is_dir() {
            SearchMatchKind::Directory
        } else {
            SearchMatchKind::File {
                size: item.metadata().ok().map(|m| m.len()),
            }
        };
        matches.push(SearchMatch {
            relative_path,
            kind,
        });

        if matches.len() >= SEARCH_CAP {
            truncated = true;
            break;
        }
    }

    Ok(SearchOutcome {
        pattern: pattern.to_string(),
        matches,
        truncated,
    })
}

/// Validate a file for transfer-out: it must exist, be a regular file,
/// and weigh in under [`DOWNLOAD_LIMIT`].
pub fn prepare_download(location: &Location, name: &str) -> Result<DownloadFile> {
    let base = require_volume(location)?;
    let target = base.join(name);
    let metadata = std::fs::metadata(&target).map_err(|e| classify_io(e, &target))?;
    if !metadata.is_file() {
        return Err(AgentError::NotFound(name.to_string()));
    }
    let size = metadata.len();
    if size > DOWNLOAD_LIMIT {
        return Err(AgentError::TooLarge {
            size,
            limit: DOWNLOAD_LIMIT,
        });
    }
    Ok(DownloadFile {
        name: Path::new(name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string()),
        path: target,
        size,
    })
}

/// Write an incoming file into the current location. Requires a
/// selected volume.
pub fn store_upload(location: &Location, file_name: &str, data: &[u8]) -> Result<PathBuf> {
    let base = require_volume(location)?;
    let target = base.join(file_name);
    std::fs::write(&target, data).map_err(|e| classify_io(e, &target))?;
    debug!(path = %target.display(), bytes = data.len(), "upload stored");
    Ok(target)
}

fn require_volume(location: &Location) -> Result<&PathBuf> {
    match location {
        Location::Root => Err(AgentError::NoVolumeSelected),
        Location::Dir(path) => Ok(path),
    }
}

fn is_hidden_dir(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|n| n.starts_with('.'))
            .unwrap_or(false)
}

fn classify_io(err: std::io::Error, path: &Path) -> AgentError {
    match err.kind() {
        std::io::ErrorKind::NotFound => AgentError::NotFound(path.display().to_string()),
        std::io::ErrorKind::PermissionDenied => AgentError::AccessDenied,
        _ => AgentError::Io(err),
    }
}
