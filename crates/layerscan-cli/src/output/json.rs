//! JSON output formatter for machine-readable results.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use super::formatter::SourceKind;
use anyhow::Result;
use layerscan_core::LayerReport;
use serde::Serialize;
use std::io::Write;
use std::io::{self};
use std::path::Path;

pub struct JsonFormatter;

#[derive(Debug, Serialize)]
struct OsOutput {
    family: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct EntryOutput {
    path: String,
    kind: &'static str,
    size: u64,
}

#[derive(Debug, Serialize)]
struct ReportOutput {
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    compression: Option<&'static str>,
    files: usize,
    directories: usize,
    symlinks: usize,
    hardlinks: usize,
    bytes: u64,
    opaque_dirs: Vec<String>,
    whiteout_files: Vec<String>,
    os: Option<OsOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entries: Option<Vec<EntryOutput>>,
    duration_ms: u128,
}

impl ReportOutput {
    fn new(source: &Path, report: &LayerReport, list: bool) -> Self {
        Self {
            source: source.display().to_string(),
            compression: report.compression.map(|c| c.name()),
            files: report.files,
            directories: report.directories,
            symlinks: report.symlinks,
            hardlinks: report.hardlinks,
            bytes: report.bytes,
            opaque_dirs: report.opaque_dirs.clone(),
            whiteout_files: report.whiteout_files.clone(),
            os: report.os.as_ref().map(|os| OsOutput {
                family: os.family.clone(),
                name: os.name.clone(),
            }),
            entries: list.then(|| {
                report
                    .entries
                    .iter()
                    .map(|e| EntryOutput {
                        path: e.path.clone(),
                        kind: e.kind.label(),
                        size: e.size,
                    })
                    .collect()
            }),
            duration_ms: report.duration.as_millis(),
        }
    }
}

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(
        &self,
        kind: SourceKind,
        source: &Path,
        report: &LayerReport,
        list: bool,
    ) -> Result<()> {
        let output = JsonOutput::success(kind.operation(), ReportOutput::new(source, report, list));
        Self::output(&output)
    }

    fn format_warning(&self, message: &str) {
        #[derive(Serialize)]
        struct WarningData {
            message: String,
        }

        let output = JsonOutput::warning(
            "warning",
            WarningData {
                message: message.to_string(),
            },
        );
        // Warnings go to stderr so stdout stays a single JSON document.
        if let Ok(json) = serde_json::to_string(&output) {
            let _ = writeln!(io::stderr(), "{json}");
        }
    }
}
