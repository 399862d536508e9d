//! Output formatter trait for CLI results.

use anyhow::Result;
use layerscan_core::LayerReport;
use serde::Serialize;
use std::path::Path;

/// What was inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A layer blob.
    Layer,
    /// A local directory tree.
    Filesystem,
}

impl SourceKind {
    /// Operation name used in JSON output.
    pub const fn operation(self) -> &'static str {
        match self {
            Self::Layer => "layer",
            Self::Filesystem => "fs",
        }
    }
}

/// Common output formatter trait
pub trait OutputFormatter {
    /// Format an inspection report, optionally listing every entry
    fn format_report(
        &self,
        kind: SourceKind,
        source: &Path,
        report: &LayerReport,
        list: bool,
    ) -> Result<()>;

    /// Format warning message
    fn format_warning(&self, message: &str);
}

/// Generic JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub operation: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Warning,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(operation: impl Into<String>, data: T) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Success,
            data: Some(data),
        }
    }

    pub fn warning(operation: impl Into<String>, data: T) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Warning,
            data: Some(data),
        }
    }
}
