//! Mounted volume enumeration and capacity probing.

use std::path::PathBuf;

/// A mounted volume: its short name as the operator types it (`C:` on
/// Windows, `/` on Unix) and the directory path at its root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub name: String,
    pub root: PathBuf,
}

/// Free/total capacity of a volume, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeCapacity {
    pub free: u64,
    pub total: u64,
}

/// Source of the currently mounted volume set.
///
/// The resolver validates volume-style input against this set and uses
/// the roots to detect when a parent step collapses to the symbolic
/// root. Tests substitute a fixture provider backed by temp dirs.
pub trait VolumeProvider {
    /// Currently mounted volumes, in display order.
    fn volumes(&self) -> Vec<Volume>;

    /// Capacity probe for a volume. `None` when the probe fails; the
    /// listing degrades that entry to "not accessible" rather than
    /// failing as a whole.
    fn capacity(&self, volume: &Volume) -> Option<VolumeCapacity>;
}

/// Volume provider backed by the host operating system.
#[derive(Debug, Default)]
pub struct SystemVolumes;

#[cfg(windows)]
impl VolumeProvider for SystemVolumes {
    fn volumes(&self) -> Vec<Volume> {
        // Probe each drive letter; metadata on the root answers for
        // mounted volumes without needing the Win32 bitmask call.
        (b'A'..=b'Z')
            .filter_map(|letter| {
                let name = format!("{}:", letter as char);
                let root = PathBuf::from(format!("{}\\", name));
                std::fs::metadata(&root).ok().map(|_| Volume { name, root })
            })
            .collect()
    }

    fn capacity(&self, volume: &Volume) -> Option<VolumeCapacity> {
        // fsutil prints "Total free bytes : n ..." lines.
        let output = std::process::Command::new("fsutil")
            .args(["volume", "diskfree", &volume.name])
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let text = String::from_utf8_lossy(&output.stdout);
        let mut free = None;
        let mut total = None;
        for line in text.lines() {
            let lower = line.to_ascii_lowercase();
            let value = line
                .split(':')
                .nth(1)
                .and_then(|v| v.split_whitespace().next())
                .and_then(|v| v.replace(',', "").parse::<u64>().ok());
            if lower.contains("total free bytes") {
                free = value;
            } else if lower.contains("total bytes") && !lower.contains("free") {
                total = value;
            }
        }
        Some(VolumeCapacity {
            free: free?,
            total: total?,
        })
    }
}

#[cfg(unix)]
impl VolumeProvider for SystemVolumes {
    fn volumes(&self) -> Vec<Volume> {
        vec![Volume {
            name: "/".to_string(),
            root: PathBuf::from("/"),
        }]
    }

    fn capacity(&self, volume: &Volume) -> Option<VolumeCapacity> {
        use std::ffi::CString;
        use std::os::unix::ffi::OsStrExt;

        let c_path = CString::new(volume.root.as_os_str().as_bytes()).ok()?;
        let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
        if rc != 0 {
            return None;
        }
        let frsize = stat.f_frsize as u64;
        Some(VolumeCapacity {
            free: stat.f_bavail as u64 * frsize,
            total: stat.f_blocks as u64 * frsize,
        })
    }
}
