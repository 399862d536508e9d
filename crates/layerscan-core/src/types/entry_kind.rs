//! Layer entry kind enumeration.

/// Kind of an entry in a layer or filesystem tree.
///
/// Tar carries many more entry types than the walker cares about; everything
/// that is not a directory, regular file, symlink or hard link collapses into
/// [`EntryKind::Other`] and is never delivered.
///
/// # Examples
///
/// ```
/// use layerscan_core::EntryKind;
///
/// assert_eq!(EntryKind::from(tar::EntryType::Regular), EntryKind::Regular);
/// assert_eq!(EntryKind::from(tar::EntryType::Link), EntryKind::Hardlink);
/// assert_eq!(EntryKind::from(tar::EntryType::Fifo), EntryKind::Other);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Directory entry.
    Directory,

    /// Regular file entry.
    Regular,

    /// Symbolic link entry.
    Symlink,

    /// Hard link entry.
    Hardlink,

    /// Device nodes, FIFOs, sparse and contiguous files, unknown types.
    Other,
}

impl EntryKind {
    /// Returns `true` if this is a directory.
    #[must_use]
    pub const fn is_directory(self) -> bool {
        matches!(self, Self::Directory)
    }

    /// Returns `true` for kinds subject to file skip rules.
    #[must_use]
    pub const fn is_file_like(self) -> bool {
        matches!(self, Self::Regular | Self::Symlink | Self::Hardlink)
    }

    /// Short lowercase label used in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::Regular => "file",
            Self::Symlink => "symlink",
            Self::Hardlink => "hardlink",
            Self::Other => "other",
        }
    }
}

impl From<tar::EntryType> for EntryKind {
    fn from(entry_type: tar::EntryType) -> Self {
        match entry_type {
            tar::EntryType::Directory => Self::Directory,
            tar::EntryType::Regular => Self::Regular,
            tar::EntryType::Symlink => Self::Symlink,
            tar::EntryType::Link => Self::Hardlink,
            _ => Self::Other,
        }
    }
}

impl From<std::fs::FileType> for EntryKind {
    fn from(file_type: std::fs::FileType) -> Self {
        if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_file() {
            Self::Regular
        } else if file_type.is_symlink() {
            Self::Symlink
        } else {
            Self::Other
        }
    }
}
