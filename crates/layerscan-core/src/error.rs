//! Error types for layer walking and content access.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Result type alias using `WalkError`.
pub type Result<T> = std::result::Result<T, WalkError>;

/// Boxed error returned by walk callbacks and analyzers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Step of lazy content materialization that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterializeStage {
    /// Creating the temporary spool directory.
    CreateTempDir,
    /// Creating the spool file inside the temporary directory.
    CreateTempFile,
    /// Copying the entry body into the spool file.
    Copy,
    /// Reading the entry body into memory.
    Read,
    /// Opening a read handle on already materialized content.
    Open,
}

impl fmt::Display for MaterializeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateTempDir => write!(f, "failed to create the temp dir"),
            Self::CreateTempFile => write!(f, "failed to create the temp file"),
            Self::Copy => write!(f, "failed to copy"),
            Self::Read => write!(f, "unable to read the file"),
            Self::Open => write!(f, "failed to open the content"),
        }
    }
}

/// Errors that can occur while walking a layer or a filesystem tree.
///
/// Every variant is fatal to the walk that produced it: the walk stops at the
/// first error and discards any whiteout or opaque paths collected so far.
#[derive(Error, Debug)]
pub enum WalkError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Reading from the layer stream failed.
    #[error("failed to read layer stream at offset {offset}: {source}")]
    Stream {
        /// Byte offset in the uncompressed stream where the read failed.
        offset: u64,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The layer is not a well-formed tar archive.
    #[error("invalid layer archive: {0}")]
    InvalidArchive(String),

    /// The walk callback rejected an entry.
    #[error("failed to analyze file {path}: {source}")]
    Analysis {
        /// Normalized path of the entry being analyzed.
        path: String,
        /// Error returned by the callback.
        #[source]
        source: BoxError,
    },

    /// Lazy materialization of an entry's content failed.
    ///
    /// The same underlying error is shared by every caller of the entry's
    /// accessor.
    #[error("failed to open {path}: {stage}: {source}")]
    Materialize {
        /// Normalized path of the entry.
        path: String,
        /// Materialization step that failed.
        stage: MaterializeStage,
        /// Underlying I/O error, shared across callers.
        #[source]
        source: Arc<io::Error>,
    },

    /// The walk root does not exist.
    #[error("source not found: {path}")]
    SourceNotFound {
        /// The missing path.
        path: PathBuf,
    },
}

impl WalkError {
    /// Returns the entry path this error refers to, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use layerscan_core::WalkError;
    ///
    /// let err = WalkError::Analysis {
    ///     path: "etc/os-release".to_string(),
    ///     source: "bad content".into(),
    /// };
    /// assert_eq!(err.path(), Some("etc/os-release"));
    ///
    /// let err = WalkError::InvalidArchive("bad header".to_string());
    /// assert_eq!(err.path(), None);
    /// ```
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Analysis { path, .. } | Self::Materialize { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Returns `true` if the error came from decoding the layer stream itself.
    #[must_use]
    pub const fn is_stream_error(&self) -> bool {
        matches!(self, Self::Stream { .. } | Self::InvalidArchive(_))
    }

    /// Returns `true` if the error was deferred until content was requested.
    #[must_use]
    pub const fn is_deferred(&self) -> bool {
        matches!(self, Self::Materialize { .. })
    }
}
