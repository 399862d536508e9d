//! Inspection reporting.

use std::time::Duration;

use crate::analyzer::OsInfo;
use crate::formats::CompressionCodec;
use crate::types::EntryKind;
use crate::types::FileInfo;

/// One delivered entry, as listed in a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySummary {
    /// Normalized entry path.
    pub path: String,
    /// Entry kind.
    pub kind: EntryKind,
    /// Content size in bytes.
    pub size: u64,
}

/// Report of a layer or filesystem inspection.
#[derive(Debug, Clone, Default)]
pub struct LayerReport {
    /// Compression codec of the layer blob, if compressed.
    pub compression: Option<CompressionCodec>,

    /// Number of regular files delivered.
    pub files: usize,

    /// Number of directories delivered.
    pub directories: usize,

    /// Number of symlinks delivered.
    pub symlinks: usize,

    /// Number of hard links delivered.
    pub hardlinks: usize,

    /// Total declared size of delivered entries.
    pub bytes: u64,

    /// Directories whose lower-layer contents are hidden.
    pub opaque_dirs: Vec<String>,

    /// Paths deleted by the layer.
    pub whiteout_files: Vec<String>,

    /// Detected operating system.
    pub os: Option<OsInfo>,

    /// Delivered entries in walk order.
    pub entries: Vec<EntrySummary>,

    /// Duration of the inspection.
    pub duration: Duration,
}

impl LayerReport {
    /// Creates a new empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accounts for one delivered entry.
    pub fn record(&mut self, path: &str, info: &FileInfo) {
        match info.kind {
            EntryKind::Regular => self.files += 1,
            EntryKind::Directory => self.directories += 1,
            EntryKind::Symlink => self.symlinks += 1,
            EntryKind::Hardlink => self.hardlinks += 1,
            EntryKind::Other => {}
        }
        self.bytes += info.size;
        self.entries.push(EntrySummary {
            path: path.to_string(),
            kind: info.kind,
            size: info.size,
        });
    }

    /// Returns the number of delivered entries.
    #[must_use]
    pub fn total_entries(&self) -> usize {
        self.files + self.directories + self.symlinks + self.hardlinks
    }

    /// Returns whether the layer deletes anything from lower layers.
    #[must_use]
    pub fn has_deletions(&self) -> bool {
        !self.opaque_dirs.is_empty() || !self.whiteout_files.is_empty()
    }
}

/// Callback trait for progress reporting during inspection.
///
/// The trait requires `Send` to allow use in multi-threaded contexts.
///
/// # Examples
///
/// ```
/// use layerscan_core::ProgressCallback;
///
/// struct SimpleProgress {
///     seen: usize,
/// }
///
/// impl ProgressCallback for SimpleProgress {
///     fn on_entry(&mut self, path: &str, size: u64) {
///         self.seen += 1;
///         println!("{}: {path} ({size} bytes)", self.seen);
///     }
///
///     fn on_complete(&mut self) {
///         println!("Inspected {} entries", self.seen);
///     }
/// }
/// ```
pub trait ProgressCallback: Send {
    /// Called once per delivered entry, before it is analyzed.
    fn on_entry(&mut self, path: &str, size: u64);

    /// Called when the walk finished successfully.
    fn on_complete(&mut self);
}

/// No-op implementation of `ProgressCallback`.
#[derive(Debug, Default)]
pub struct NoopProgress;

impl ProgressCallback for NoopProgress {
    fn on_entry(&mut self, _path: &str, _size: u64) {}

    fn on_complete(&mut self) {}
}
