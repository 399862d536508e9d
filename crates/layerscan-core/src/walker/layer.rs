//! Single-pass layer walker.

use std::io::Read;

use crate::BoxError;
use crate::ContentAccessor;
use crate::Result;
use crate::WalkConfig;
use crate::WalkError;
use crate::filter::SkipFilter;
use crate::filter::under_skipped_dir;
use crate::path;
use crate::stream::TarStream;
use crate::types::EntryKind;
use crate::types::FileInfo;
use crate::walker::OPAQUE_MARKER;
use crate::walker::WHITEOUT_PREFIX;

/// Deletion facts recorded by one layer.
///
/// Consumed by the step merging layers into a final filesystem view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerChanges {
    /// Directories whose lower-layer contents are hidden, in stream order.
    ///
    /// Each path keeps the trailing `/` of its directory part; an opaque
    /// marker at the layer root yields an empty string.
    pub opaque_dirs: Vec<String>,

    /// Paths deleted by this layer, in stream order.
    pub whiteout_files: Vec<String>,
}

impl LayerChanges {
    /// Returns `true` if the layer recorded no deletion.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.opaque_dirs.is_empty() && self.whiteout_files.is_empty()
    }
}

/// What the walker does with one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Disposition {
    Opaque(String),
    Whiteout(String),
    SkipDir,
    SkipFile,
    Unsupported,
    UnderSkippedDir,
    Deliver,
}

/// Walks layer tar streams.
///
/// The walker itself is stateless between calls: the set of skipped
/// directories lives only for the duration of one [`walk`](Self::walk).
///
/// Entries are processed in archive order. Pruning below a skipped directory
/// only works when the archive lists the directory before its children, as
/// image build tools do.
///
/// # Examples
///
/// ```
/// use layerscan_core::LayerWalker;
/// use layerscan_core::WalkConfig;
/// use layerscan_core::test_utils::TarTestBuilder;
///
/// let layer = TarTestBuilder::new()
///     .add_file("etc/os-release", b"ID=alpine\n")
///     .add_whiteout("etc/", "hostname")
///     .add_opaque("var/cache/")
///     .build();
///
/// let walker = LayerWalker::new(&WalkConfig::default());
/// let mut seen = Vec::new();
/// let changes = walker.walk(layer.as_slice(), |path, _info, _content| {
///     seen.push(path.to_string());
///     Ok(())
/// })?;
///
/// assert_eq!(seen, vec!["etc/os-release"]);
/// assert_eq!(changes.whiteout_files, vec!["etc/hostname"]);
/// assert_eq!(changes.opaque_dirs, vec!["var/cache/"]);
/// # Ok::<(), layerscan_core::WalkError>(())
/// ```
#[derive(Debug, Clone)]
pub struct LayerWalker {
    filter: SkipFilter,
}

impl LayerWalker {
    /// Creates a walker applying the skip policy of `config`.
    #[must_use]
    pub fn new(config: &WalkConfig) -> Self {
        Self {
            filter: SkipFilter::new(config),
        }
    }

    /// Walks one layer, delivering entries to `callback`.
    ///
    /// The callback receives the normalized path, the entry metadata and an
    /// accessor for the entry content. The accessor is only valid during the
    /// call; whatever the callback did not read is discarded afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`WalkError::Analysis`] if the callback fails, and a stream
    /// error if the layer cannot be decoded. Markers recorded before the
    /// failure are discarded.
    pub fn walk<R, F>(&self, layer: R, mut callback: F) -> Result<LayerChanges>
    where
        R: Read + Send,
        F: FnMut(&str, &FileInfo, &ContentAccessor<'_>) -> std::result::Result<(), BoxError>,
    {
        let mut stream = TarStream::new(layer);
        let mut changes = LayerChanges::default();
        let mut skipped_dirs: Vec<String> = Vec::new();

        while let Some((header, mut body)) = stream.next_entry()? {
            let entry_path = path::normalize(&header.path);

            match self.classify(&entry_path, header.kind(), &skipped_dirs) {
                Disposition::Opaque(dir) => {
                    tracing::debug!(dir = %dir, "opaque directory marker");
                    changes.opaque_dirs.push(dir);
                }
                Disposition::Whiteout(deleted) => {
                    tracing::debug!(path = %deleted, "whiteout marker");
                    changes.whiteout_files.push(deleted);
                }
                Disposition::SkipDir => {
                    tracing::debug!(path = %entry_path, "skipping directory");
                    skipped_dirs.push(entry_path);
                }
                Disposition::SkipFile => {
                    tracing::debug!(path = %entry_path, "skipping file");
                }
                Disposition::Unsupported | Disposition::UnderSkippedDir => {}
                Disposition::Deliver => {
                    let (_, name) = path::split(&entry_path);
                    let info = header.file_info(name);
                    tracing::trace!(path = %entry_path, kind = info.kind.label(), size = info.size, "delivering entry");

                    let accessor = ContentAccessor::from_stream(entry_path.as_str(), header.size, &mut body);
                    let outcome = callback(&entry_path, &info, &accessor);
                    drop(accessor);

                    outcome.map_err(|source| WalkError::Analysis {
                        path: entry_path,
                        source,
                    })?;
                }
            }

            body.finish()?;
        }

        Ok(changes)
    }

    /// Decides the fate of one entry.
    ///
    /// Markers win over every other rule, then the skip policy by entry kind,
    /// then containment in a directory skipped earlier in the walk.
    fn classify(&self, entry_path: &str, kind: EntryKind, skipped_dirs: &[String]) -> Disposition {
        let (dir, name) = path::split(entry_path);

        if name == OPAQUE_MARKER {
            return Disposition::Opaque(dir.to_string());
        }

        if let Some(deleted) = name.strip_prefix(WHITEOUT_PREFIX) {
            return Disposition::Whiteout(path::join(&[dir, deleted]));
        }

        match kind {
            EntryKind::Directory => {
                if self.filter.should_skip_dir(entry_path) {
                    return Disposition::SkipDir;
                }
            }
            EntryKind::Regular | EntryKind::Symlink | EntryKind::Hardlink => {
                if self.filter.should_skip_file(entry_path) {
                    return Disposition::SkipFile;
                }
            }
            EntryKind::Other => return Disposition::Unsupported,
        }

        if under_skipped_dir(entry_path, skipped_dirs) {
            return Disposition::UnderSkippedDir;
        }

        Disposition::Deliver
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::TarTestBuilder;

    fn walker(skip_files: &[&str], skip_dirs: &[&str]) -> LayerWalker {
        let config = WalkConfig::empty()
            .with_skip_files(skip_files.iter().map(ToString::to_string).collect())
            .with_skip_dirs(skip_dirs.iter().map(ToString::to_string).collect());
        LayerWalker::new(&config)
    }

    fn delivered(walker: &LayerWalker, layer: &[u8]) -> (Vec<String>, LayerChanges) {
        let mut seen = Vec::new();
        let changes = walker
            .walk(layer, |path, _, _| {
                seen.push(path.to_string());
                Ok(())
            })
            .unwrap();
        (seen, changes)
    }

    #[test]
    fn test_classify_priority() {
        let w = walker(&["*"], &["*"]);
        let skipped = vec!["var".to_string()];

        assert_eq!(
            w.classify("var/.wh..wh..opq", EntryKind::Regular, &skipped),
            Disposition::Opaque("var/".to_string())
        );
        assert_eq!(
            w.classify("var/.wh.log", EntryKind::Regular, &skipped),
            Disposition::Whiteout("var/log".to_string())
        );
        assert_eq!(w.classify("var/x", EntryKind::Directory, &skipped), Disposition::SkipDir);
        assert_eq!(w.classify("var/x", EntryKind::Regular, &skipped), Disposition::SkipFile);
        assert_eq!(w.classify("var/x", EntryKind::Other, &skipped), Disposition::Unsupported);
    }

    #[test]
    fn test_classify_under_skipped_dir() {
        let w = walker(&[], &[]);
        let skipped = vec!["node_modules".to_string()];
        assert_eq!(
            w.classify("node_modules/a.js", EntryKind::Regular, &skipped),
            Disposition::UnderSkippedDir
        );
        assert_eq!(
            w.classify("node_modules2/a.js", EntryKind::Regular, &skipped),
            Disposition::Deliver
        );
    }

    #[test]
    fn test_root_markers() {
        let w = walker(&[], &[]);
        assert_eq!(
            w.classify(".wh..wh..opq", EntryKind::Regular, &[]),
            Disposition::Opaque(String::new())
        );
        assert_eq!(
            w.classify(".wh.hostname", EntryKind::Regular, &[]),
            Disposition::Whiteout("hostname".to_string())
        );
    }

    #[test]
    fn test_markers_are_not_delivered() {
        let layer = TarTestBuilder::new()
            .add_directory("etc/")
            .add_whiteout("etc/", "hostname")
            .add_opaque("var/cache/")
            .add_file("var/cache/pkg", b"data")
            .build();

        let (seen, changes) = delivered(&walker(&[], &[]), &layer);
        assert_eq!(seen, vec!["etc", "var/cache/pkg"]);
        assert_eq!(changes.whiteout_files, vec!["etc/hostname"]);
        assert_eq!(changes.opaque_dirs, vec!["var/cache/"]);
    }

    #[test]
    fn test_skipped_dir_prunes_children() {
        let layer = TarTestBuilder::new()
            .add_directory("node_modules/")
            .add_file("node_modules/pkg/index.js", b"x")
            .add_file("node_modules2/index.js", b"y")
            .add_file("src/main.js", b"z")
            .build();

        let (seen, _) = delivered(&walker(&[], &["node_modules"]), &layer);
        assert_eq!(seen, vec!["node_modules2/index.js", "src/main.js"]);
    }

    #[test]
    fn test_child_before_skipped_dir_is_delivered() {
        let layer = TarTestBuilder::new()
            .add_file("node_modules/early.js", b"x")
            .add_directory("node_modules/")
            .add_file("node_modules/late.js", b"y")
            .build();

        let (seen, _) = delivered(&walker(&[], &["node_modules"]), &layer);
        assert_eq!(seen, vec!["node_modules/early.js"]);
    }

    #[test]
    fn test_other_kinds_are_ignored() {
        let layer = TarTestBuilder::new()
            .add_fifo("run/pipe")
            .add_symlink("bin/sh", "busybox")
            .add_hardlink("bin/ash", "bin/busybox")
            .build();

        let mut kinds = Vec::new();
        walker(&[], &[])
            .walk(layer.as_slice(), |_, info, _| {
                kinds.push(info.kind);
                Ok(())
            })
            .unwrap();
        assert_eq!(kinds, vec![EntryKind::Symlink, EntryKind::Hardlink]);
    }

    #[test]
    fn test_paths_are_normalized() {
        let layer = TarTestBuilder::new()
            .add_raw_file("/etc/passwd", b"root")
            .add_raw_file("./usr//bin/../lib/libc.so", b"elf")
            .build();

        let (seen, _) = delivered(&walker(&[], &[]), &layer);
        assert_eq!(seen, vec!["etc/passwd", "usr/lib/libc.so"]);
    }

    #[test]
    fn test_content_is_readable_from_callback() {
        let layer = TarTestBuilder::new()
            .add_file("etc/os-release", b"ID=alpine\n")
            .add_file("etc/motd", b"welcome\n")
            .build();

        let mut contents = Vec::new();
        walker(&[], &[])
            .walk(layer.as_slice(), |path, info, accessor| {
                let (mut reader, release) = accessor.open()?;
                let mut text = String::new();
                reader.read_to_string(&mut text)?;
                release.release()?;
                assert_eq!(info.size, text.len() as u64);
                contents.push((path.to_string(), text));
                Ok(())
            })
            .unwrap();

        assert_eq!(
            contents,
            vec![
                ("etc/os-release".to_string(), "ID=alpine\n".to_string()),
                ("etc/motd".to_string(), "welcome\n".to_string()),
            ]
        );
    }

    #[test]
    fn test_callback_error_aborts() {
        let layer = TarTestBuilder::new()
            .add_whiteout("", "gone")
            .add_file("a", b"1")
            .add_file("b", b"2")
            .build();

        let mut calls = 0;
        let err = walker(&[], &[])
            .walk(layer.as_slice(), |path, _, _| {
                calls += 1;
                if path == "a" {
                    return Err("boom".into());
                }
                Ok(())
            })
            .unwrap_err();

        assert_eq!(calls, 1);
        assert!(matches!(err, WalkError::Analysis { ref path, .. } if path == "a"));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_truncated_layer_fails() {
        let layer = TarTestBuilder::new()
            .add_whiteout("etc/", "hostname")
            .add_file("big", &[1u8; 4096])
            .build();

        let err = walker(&[], &[])
            .walk(&layer[..2048], |_, _, _| Ok(()))
            .unwrap_err();
        assert!(err.is_stream_error());
    }

    #[test]
    fn test_empty_layer() {
        let (seen, changes) = delivered(&walker(&[], &[]), &[]);
        assert!(seen.is_empty());
        assert!(changes.is_empty());
    }
}
