//! Listing and search result types.

use std::path::PathBuf;
use std::time::SystemTime;

use super::volumes::VolumeCapacity;

/// One entry in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

/// Kind of a listing entry. Size and modification time are carried for
/// files only; an entry whose metadata probe fails degrades to
/// `Inaccessible` instead of aborting the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// Synthetic `..` entry.
    Parent,
    Directory,
    File {
        size: u64,
        modified: Option<SystemTime>,
    },
    Inaccessible,
}

/// One volume row in the root listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeEntry {
    pub name: String,
    /// `None` when the capacity probe failed; rendered as inaccessible.
    pub capacity: Option<VolumeCapacity>,
}

/// Output of the list operation: volumes from the symbolic root,
/// directory entries otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListOutcome {
    Volumes(Vec<VolumeEntry>),
    Directory {
        path: PathBuf,
        entries: Vec<DirEntry>,
    },
}

/// One search hit, with the path relative to the searched location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    pub relative_path: PathBuf,
    pub kind: SearchMatchKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchMatchKind {
    Directory,
    /// `size` is `None` when the metadata probe failed.
    File { size: Option<u64> },
}

/// Search result set. `truncated` is a flagged partial-result
/// condition, not an error: traversal stopped at the match cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub pattern: String,
    pub matches: Vec<SearchMatch>,
    pub truncated: bool,
}

impl SearchOutcome {
    pub fn total_found(&self) -> usize {
        self.matches.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_kind_file() {
        let entry = DirEntry {
            name: "a.txt".into(),
            kind: EntryKind::File {
                size: 12,
                modified: None,
            },
        };
        assert!(matches!(entry.kind, EntryKind::File { size: 12, .. }));
    }

    #[test]
    fn test_search_outcome_total() {
        let outcome = SearchOutcome {
            pattern: "x".into(),
            matches: vec![SearchMatch {
                relative_path: PathBuf::from("x.txt"),
                kind: SearchMatchKind::File { size: Some(1) },
            }],
            truncated: false,
        };
        assert_eq!(outcome.total_found(), 1);
    }
}
