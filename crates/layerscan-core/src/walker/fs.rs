//! Local filesystem walker.

use std::path::Component;
use std::path::Path;

use walkdir::WalkDir;

use crate::BoxError;
use crate::ContentAccessor;
use crate::Result;
use crate::WalkConfig;
use crate::WalkError;
use crate::filter::SkipFilter;
use crate::path;
use crate::types::FileInfo;

/// Walks a directory tree with the layer skip policy.
///
/// Paths handed to the callback are relative to the root and use `/` as
/// separator. Skipped directories are pruned without being descended into.
/// Only regular files are delivered; symlinks are not followed.
///
/// # Examples
///
/// ```no_run
/// use layerscan_core::FsWalker;
/// use layerscan_core::WalkConfig;
///
/// let walker = FsWalker::new(&WalkConfig::default());
/// walker.walk("./rootfs", |path, info, _content| {
///     println!("{path}: {} bytes", info.size);
///     Ok(())
/// })?;
/// # Ok::<(), layerscan_core::WalkError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FsWalker {
    filter: SkipFilter,
}

impl FsWalker {
    /// Creates a walker applying the skip policy of `config`.
    #[must_use]
    pub fn new(config: &WalkConfig) -> Self {
        Self {
            filter: SkipFilter::new(config),
        }
    }

    /// Walks the tree below `root`, delivering regular files to `callback`.
    ///
    /// # Errors
    ///
    /// Returns [`WalkError::SourceNotFound`] if `root` does not exist,
    /// [`WalkError::Io`] if a directory cannot be read, and
    /// [`WalkError::Analysis`] if the callback fails.
    pub fn walk<P, F>(&self, root: P, mut callback: F) -> Result<()>
    where
        P: AsRef<Path>,
        F: FnMut(&str, &FileInfo, &ContentAccessor<'_>) -> std::result::Result<(), BoxError>,
    {
        let root = root.as_ref();
        if !root.try_exists()? {
            return Err(WalkError::SourceNotFound {
                path: root.to_path_buf(),
            });
        }

        let mut entries = WalkDir::new(root).follow_links(false).into_iter();
        while let Some(entry) = entries.next() {
            let entry = entry.map_err(|e| {
                WalkError::Io(std::io::Error::other(format!("walkdir error: {e}")))
            })?;

            let Some(rel) = relative_path(root, entry.path()) else {
                continue;
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                if self.filter.should_skip_dir(&rel) {
                    tracing::debug!(path = %rel, "skipping directory");
                    entries.skip_current_dir();
                }
                continue;
            }

            if !file_type.is_file() {
                continue;
            }

            if self.filter.should_skip_file(&rel) {
                tracing::debug!(path = %rel, "skipping file");
                continue;
            }

            let metadata = entry.metadata().map_err(|e| {
                WalkError::Io(std::io::Error::other(format!(
                    "cannot read metadata for {}: {e}",
                    entry.path().display()
                )))
            })?;

            let (_, name) = path::split(&rel);
            let info = FileInfo::from_metadata(name, &metadata);
            tracing::trace!(path = %rel, size = info.size, "delivering file");

            let accessor = ContentAccessor::from_file(rel.as_str(), info.size, entry.path());
            callback(&rel, &info, &accessor).map_err(|source| WalkError::Analysis { path: rel, source })?;
        }

        Ok(())
    }
}

/// Converts a path below `root` into a `/`-separated relative path.
///
/// Returns `None` for the root itself.
fn relative_path(root: &Path, full: &Path) -> Option<String> {
    let rel = full.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
