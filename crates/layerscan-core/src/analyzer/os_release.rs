//! Operating system detection from `os-release` files.

use std::io::BufRead;
use std::io::BufReader;

use crate::BoxError;
use crate::analyzer::AnalysisInput;
use crate::analyzer::AnalysisResult;
use crate::analyzer::Analyzer;
use crate::analyzer::AnalyzerError;
use crate::analyzer::AnalyzerType;
use crate::analyzer::OsInfo;
use crate::types::FileInfo;

const OPEN_EULER_FAMILY: &str = "openEuler";
const OPEN_EULER_FILES: &[&str] = &["etc/os-release"];
const OS_RELEASE_FILES: &[&str] = &["etc/os-release", "usr/lib/os-release"];

/// Detects openEuler releases.
///
/// Looks for a `NAME="openEuler...` line and takes the release from the
/// `VERSION_ID` line that follows it.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenEulerAnalyzer;

impl Analyzer for OpenEulerAnalyzer {
    fn analyzer_type(&self) -> AnalyzerType {
        AnalyzerType::OpenEuler
    }

    fn version(&self) -> u32 {
        1
    }

    fn required(&self, path: &str, _info: &FileInfo) -> bool {
        OPEN_EULER_FILES.contains(&path)
    }

    fn analyze(&self, input: AnalysisInput<'_>) -> Result<AnalysisResult, BoxError> {
        let mut is_open_euler = false;

        for line in BufReader::new(input.content).lines() {
            let line = line.map_err(AnalyzerError::Io)?;
            if line.starts_with("NAME=\"openEuler") {
                is_open_euler = true;
                continue;
            }

            if is_open_euler && let Some(value) = line.strip_prefix("VERSION_ID=") {
                return Ok(AnalysisResult {
                    os: Some(OsInfo {
                        family: OPEN_EULER_FAMILY.to_string(),
                        name: unquote(value).to_string(),
                    }),
                });
            }
        }

        Err(AnalyzerError::OsNotDetected(AnalyzerType::OpenEuler).into())
    }
}

/// Detects any distribution from the `ID` and `VERSION_ID` keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsReleaseAnalyzer;

impl Analyzer for OsReleaseAnalyzer {
    fn analyzer_type(&self) -> AnalyzerType {
        AnalyzerType::OsRelease
    }

    fn version(&self) -> u32 {
        1
    }

    fn required(&self, path: &str, _info: &FileInfo) -> bool {
        OS_RELEASE_FILES.contains(&path)
    }

    fn analyze(&self, input: AnalysisInput<'_>) -> Result<AnalysisResult, BoxError> {
        let mut id = None;
        let mut version_id = None;

        for line in BufReader::new(input.content).lines() {
            let line = line.map_err(AnalyzerError::Io)?;
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key.trim() {
                "ID" => id = Some(unquote(value).to_string()),
                "VERSION_ID" => version_id = Some(unquote(value).to_string()),
                _ => {}
            }
        }

        match id {
            Some(family) if !family.is_empty() => Ok(AnalysisResult {
                os: Some(OsInfo {
                    family,
                    name: version_id.unwrap_or_default(),
                }),
            }),
            _ => Err(AnalyzerError::OsNotDetected(AnalyzerType::OsRelease).into()),
        }
    }
}

fn unquote(value: &str) -> &str {
    value.trim().trim_matches(|c| c == '"' || c == '\'').trim()
}
