//! Error conversion utilities for CLI.
//!
//! Converts layerscan-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use layerscan_core::WalkError;
use std::path::Path;

/// Converts `WalkError` to user-friendly anyhow error with context
pub fn convert_walk_error(err: WalkError, source: &Path) -> anyhow::Error {
    match err {
        WalkError::SourceNotFound { path } => {
            anyhow!(
                "Source not found: {}\n\
                 HINT: Check the path and that it is readable.",
                path.display()
            )
        }
        WalkError::Stream { offset, source: io_err } => {
            anyhow!(
                "Failed to read layer '{}' at offset {}: {}\n\
                 HINT: The layer blob may be truncated or use an unsupported compression.",
                source.display(),
                offset,
                io_err
            )
        }
        WalkError::InvalidArchive(reason) => {
            anyhow!(
                "Invalid layer '{}': {}\n\
                 HINT: Supported layer formats: tar, tar.gz, tar.zst",
                source.display(),
                reason
            )
        }
        WalkError::Materialize { .. } => materialize_hint(&err, source),
        WalkError::Analysis {
            source: ref inner, ..
        }
            if inner
                .downcast_ref::<WalkError>()
                .is_some_and(WalkError::is_deferred) =>
        {
            materialize_hint(&err, source)
        }
        WalkError::Io(io_err) => {
            anyhow!("I/O error while processing '{}': {}", source.display(), io_err)
        }
        _ => anyhow::Error::from(err).context(format!("Error processing '{}'", source.display())),
    }
}

fn materialize_hint(err: &WalkError, source: &Path) -> anyhow::Error {
    anyhow!(
        "Failed to read entry content in '{}': {}\n\
         HINT: Large entries are spooled to the temporary directory; check TMPDIR has free space.",
        source.display(),
        err
    )
}

/// Adds context to a generic error about inspection operations
pub fn add_source_context<T>(result: Result<T, WalkError>, source: &Path) -> anyhow::Result<T> {
    result.map_err(|e| convert_walk_error(e, source))
}
