//! Per-entry metadata handed to walk callbacks.

use std::fs::Metadata;
use std::time::Duration;
use std::time::SystemTime;

use crate::types::EntryKind;

/// Metadata of one delivered entry.
///
/// Built from a decoded tar header for layers, or from `std::fs::Metadata`
/// for local filesystem walks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Base name of the entry.
    pub name: String,

    /// Content size in bytes (0 for directories and links).
    pub size: u64,

    /// Permission bits and file type bits as recorded by the source.
    pub mode: u32,

    /// Owner user id.
    pub uid: u64,

    /// Owner group id.
    pub gid: u64,

    /// Last modification time, if representable.
    pub modified: Option<SystemTime>,

    /// Entry kind.
    pub kind: EntryKind,

    /// Link target for symlinks and hard links.
    pub link_target: Option<String>,
}

impl FileInfo {
    /// Builds metadata for a local file.
    #[must_use]
    pub fn from_metadata(name: impl Into<String>, metadata: &Metadata) -> Self {
        Self {
            name: name.into(),
            size: if metadata.is_file() { metadata.len() } else { 0 },
            mode: mode_of(metadata),
            uid: uid_of(metadata),
            gid: gid_of(metadata),
            modified: metadata.modified().ok(),
            kind: EntryKind::from(metadata.file_type()),
            link_target: None,
        }
    }

    /// Converts a tar mtime (seconds since the epoch) into a `SystemTime`.
    #[must_use]
    pub fn mtime_to_system_time(secs: u64) -> Option<SystemTime> {
        SystemTime::UNIX_EPOCH.checked_add(Duration::from_secs(secs))
    }

    /// Returns `true` if this entry is a directory.
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        self.kind.is_directory()
    }
}

#[cfg(unix)]
fn mode_of(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    metadata.mode()
}

#[cfg(not(unix))]
fn mode_of(metadata: &Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}

#[cfg(unix)]
fn uid_of(metadata: &Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    u64::from(metadata.uid())
}

#[cfg(not(unix))]
fn uid_of(_metadata: &Metadata) -> u64 {
    0
}

#[cfg(unix)]
fn gid_of(metadata: &Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    u64::from(metadata.gid())
}

#[cfg(not(unix))]
fn gid_of(_metadata: &Metadata) -> u64 {
    0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_from_metadata_regular_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("os-release");
        fs::write(&path, b"ID=alpine\n").unwrap();

        let info = FileInfo::from_metadata("os-release", &fs::metadata(&path).unwrap());
        assert_eq!(info.name, "os-release");
        assert_eq!(info.size, 10);
        assert_eq!(info.kind, EntryKind::Regular);
        assert!(info.modified.is_some());
        assert!(!info.is_dir());
    }

    #[test]
    fn test_from_metadata_directory() {
        let temp = TempDir::new().unwrap();
        let info = FileInfo::from_metadata("root", &fs::metadata(temp.path()).unwrap());
        assert_eq!(info.size, 0);
        assert!(info.is_dir());
    }

    #[test]
    fn test_mtime_conversion() {
        let time = FileInfo::mtime_to_system_time(60).unwrap();
        assert_eq!(
            time.duration_since(SystemTime::UNIX_EPOCH).unwrap(),
            Duration::from_secs(60)
        );
    }
}
