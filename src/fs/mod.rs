//! File manager core: locations, volume enumeration, path resolution,
//! and the capability actions that ride on a resolved location.

mod entry;
mod location;
pub mod ops;
mod resolver;
mod volumes;

pub use entry::{
    DirEntry, EntryKind, ListOutcome, SearchMatch, SearchMatchKind, SearchOutcome, VolumeEntry,
};
pub use location::{normalize, Location};
pub use ops::{Deleted, DownloadFile, DOWNLOAD_LIMIT, SEARCH_CAP};
pub use resolver::PathResolver;
pub use volumes::{SystemVolumes, Volume, VolumeCapacity, VolumeProvider};
