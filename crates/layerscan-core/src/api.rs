//! High-level public API for layer and filesystem inspection.

use std::io::Read;
use std::path::Path;
use std::time::Instant;

use crate::FsWalker;
use crate::LayerReport;
use crate::LayerWalker;
use crate::NoopProgress;
use crate::ProgressCallback;
use crate::Result;
use crate::WalkConfig;
use crate::analyzer::AnalysisResult;
use crate::analyzer::AnalyzerGroup;
use crate::formats::open_layer;

/// Inspects a layer blob on disk.
///
/// The blob may be a plain, gzip-compressed or zstd-compressed tar stream.
/// Every delivered entry is counted and handed to the built-in analyzers.
///
/// # Errors
///
/// Returns an error if:
/// - The blob does not exist or cannot be read
/// - The tar stream is corrupt or truncated
/// - Content of an analyzed entry cannot be materialized
///
/// # Examples
///
/// ```no_run
/// use layerscan_core::WalkConfig;
/// use layerscan_core::inspect_layer;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let report = inspect_layer("layer.tar.gz", &WalkConfig::default())?;
/// println!("{} files, {} whiteouts", report.files, report.whiteout_files.len());
/// # Ok(())
/// # }
/// ```
pub fn inspect_layer<P: AsRef<Path>>(layer_path: P, config: &WalkConfig) -> Result<LayerReport> {
    inspect_layer_with_progress(layer_path, config, &mut NoopProgress)
}

/// Inspects a layer blob on disk, reporting progress per entry.
///
/// # Errors
///
/// See [`inspect_layer`].
pub fn inspect_layer_with_progress<P: AsRef<Path>>(
    layer_path: P,
    config: &WalkConfig,
    progress: &mut dyn ProgressCallback,
) -> Result<LayerReport> {
    let start = Instant::now();
    let (codec, layer) = open_layer(layer_path.as_ref())?;

    let mut report = inspect_reader(layer, config, progress)?;
    report.compression = codec;
    report.duration = start.elapsed();
    Ok(report)
}

/// Inspects an uncompressed layer tar stream.
///
/// # Errors
///
/// See [`inspect_layer`].
///
/// # Examples
///
/// ```
/// use layerscan_core::NoopProgress;
/// use layerscan_core::WalkConfig;
/// use layerscan_core::inspect_reader;
/// use layerscan_core::test_utils::TarTestBuilder;
///
/// let layer = TarTestBuilder::new()
///     .add_file("etc/os-release", b"ID=alpine\nVERSION_ID=3.19.1\n")
///     .add_whiteout("etc/", "hostname")
///     .build();
///
/// let report = inspect_reader(layer.as_slice(), &WalkConfig::default(), &mut NoopProgress)?;
/// assert_eq!(report.files, 1);
/// assert_eq!(report.whiteout_files, vec!["etc/hostname"]);
/// assert_eq!(report.os.unwrap().family, "alpine");
/// # Ok::<(), layerscan_core::WalkError>(())
/// ```
pub fn inspect_reader<R: Read + Send>(
    layer: R,
    config: &WalkConfig,
    progress: &mut dyn ProgressCallback,
) -> Result<LayerReport> {
    let start = Instant::now();
    let walker = LayerWalker::new(config);
    let analyzers = AnalyzerGroup::with_defaults();

    let mut report = LayerReport::new();
    let mut analysis = AnalysisResult::default();

    let changes = walker.walk(layer, |path, info, accessor| {
        report.record(path, info);
        progress.on_entry(path, info.size);
        analyzers.analyze_file(&mut analysis, path, info, accessor)?;
        Ok(())
    })?;
    progress.on_complete();

    report.opaque_dirs = changes.opaque_dirs;
    report.whiteout_files = changes.whiteout_files;
    report.os = analysis.os;
    report.duration = start.elapsed();
    Ok(report)
}

/// Inspects a local directory tree.
///
/// # Errors
///
/// Returns an error if the root does not exist, a directory cannot be read,
/// or a file cannot be opened for analysis.
///
/// # Examples
///
/// ```no_run
/// use layerscan_core::WalkConfig;
/// use layerscan_core::inspect_filesystem;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let report = inspect_filesystem("/srv/rootfs", &WalkConfig::default())?;
/// if let Some(os) = report.os {
///     println!("{} {}", os.family, os.name);
/// }
/// # Ok(())
/// # }
/// ```
pub fn inspect_filesystem<P: AsRef<Path>>(root: P, config: &WalkConfig) -> Result<LayerReport> {
    inspect_filesystem_with_progress(root, config, &mut NoopProgress)
}

/// Inspects a local directory tree, reporting progress per file.
///
/// # Errors
///
/// See [`inspect_filesystem`].
pub fn inspect_filesystem_with_progress<P: AsRef<Path>>(
    root: P,
    config: &WalkConfig,
    progress: &mut dyn ProgressCallback,
) -> Result<LayerReport> {
    let start = Instant::now();
    let walker = FsWalker::new(config);
    let analyzers = AnalyzerGroup::with_defaults();

    let mut report = LayerReport::new();
    let mut analysis = AnalysisResult::default();

    walker.walk(root, |path, info, accessor| {
        report.record(path, info);
        progress.on_entry(path, info.size);
        analyzers.analyze_file(&mut analysis, path, info, accessor)?;
        Ok(())
    })?;
    progress.on_complete();

    report.os = analysis.os;
    report.duration = start.elapsed();
    Ok(report)
}
