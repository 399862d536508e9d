//! Container image layer walker with whiteout handling and once-only content
//! access.
//!
//! `layerscan-core` reads an image layer as a single forward-only tar
//! stream and reconstructs what a later merge step needs from it:
//!
//! - the entries that survive the skip policy, each handed to a callback
//!   together with a [`ContentAccessor`] that can be opened any number of
//!   times while the underlying stream is read only once,
//! - the paths deleted by whiteout markers and the directories hidden by
//!   opaque markers.
//!
//! # Examples
//!
//! ```no_run
//! use layerscan_core::WalkConfig;
//! use layerscan_core::inspect_layer;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let report = inspect_layer("layer.tar.gz", &WalkConfig::default())?;
//! println!("Delivered {} entries", report.total_entries());
//! for path in &report.whiteout_files {
//!     println!("deleted: {path}");
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod analyzer;
pub mod api;
pub mod config;
pub mod content;
pub mod error;
pub mod filter;
pub mod formats;
pub mod path;
pub mod report;
pub mod stream;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
pub mod walker;

// Re-export main API types
pub use api::inspect_filesystem;
pub use api::inspect_filesystem_with_progress;
pub use api::inspect_layer;
pub use api::inspect_layer_with_progress;
pub use api::inspect_reader;
pub use config::WalkConfig;
pub use content::ContentAccessor;
pub use content::ContentReader;
pub use content::Release;
pub use content::SPOOL_THRESHOLD;
pub use error::BoxError;
pub use error::MaterializeStage;
pub use error::Result;
pub use error::WalkError;
pub use report::EntrySummary;
pub use report::LayerReport;
pub use report::NoopProgress;
pub use report::ProgressCallback;
pub use walker::FsWalker;
pub use walker::LayerChanges;
pub use walker::LayerWalker;

// Re-export types module for easier access
pub use types::EntryKind;
pub use types::FileInfo;
