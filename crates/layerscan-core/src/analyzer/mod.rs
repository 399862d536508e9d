//! Analyzers consuming walked entries.
//!
//! An [`AnalyzerGroup`] is the usual walk callback target: for every
//! delivered entry it runs each analyzer that declares interest in the path,
//! all of them concurrently, each reading the content through its own
//! [`ContentAccessor::open`] call.

mod os_release;

use std::fmt;
use std::io::Read;
use std::thread;

use thiserror::Error;

use crate::BoxError;
use crate::ContentAccessor;
use crate::Result;
use crate::WalkError;
use crate::content::Release;
use crate::types::FileInfo;

pub use os_release::OpenEulerAnalyzer;
pub use os_release::OsReleaseAnalyzer;

/// Identifies an analyzer in logs and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalyzerType {
    /// openEuler release detection.
    OpenEuler,
    /// Generic `os-release` detection.
    OsRelease,
}

impl fmt::Display for AnalyzerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenEuler => write!(f, "openEuler"),
            Self::OsRelease => write!(f, "os-release"),
        }
    }
}

/// Errors reported by the built-in analyzers.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// The content did not identify an operating system.
    #[error("{0}: unable to analyze OS information")]
    OsNotDetected(AnalyzerType),

    /// Reading the content failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Operating system identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsInfo {
    /// Distribution family, e.g. `openEuler` or `alpine`.
    pub family: String,
    /// Release name or version.
    pub name: String,
}

/// Facts extracted from one or more entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisResult {
    /// Detected operating system.
    pub os: Option<OsInfo>,
}

impl AnalysisResult {
    /// Folds `other` into `self`; facts already present are kept.
    pub fn merge(&mut self, other: Self) {
        if self.os.is_none() {
            self.os = other.os;
        }
    }

    /// Returns `true` if nothing was detected.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.os.is_none()
    }
}

/// Content handed to [`Analyzer::analyze`].
pub struct AnalysisInput<'a> {
    /// Normalized entry path.
    pub path: &'a str,
    /// Entry metadata.
    pub info: &'a FileInfo,
    /// Entry content, positioned at the start.
    pub content: &'a mut dyn Read,
}

/// Extracts facts from entries it declares interest in.
pub trait Analyzer: Send + Sync {
    /// Identifier used in logs and reports.
    fn analyzer_type(&self) -> AnalyzerType;

    /// Version of the analysis logic.
    fn version(&self) -> u32;

    /// Returns `true` if the entry at `path` must be analyzed.
    fn required(&self, path: &str, info: &FileInfo) -> bool;

    /// Analyzes one entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be read or carries nothing this
    /// analyzer recognizes.
    fn analyze(&self, input: AnalysisInput<'_>) -> std::result::Result<AnalysisResult, BoxError>;
}

/// Ordered set of analyzers.
///
/// Results are merged in registration order, so the first registered
/// analyzer wins when several detect the same fact.
///
/// # Examples
///
/// ```
/// use layerscan_core::ContentAccessor;
/// use layerscan_core::analyzer::AnalysisResult;
/// use layerscan_core::analyzer::AnalyzerGroup;
/// use layerscan_core::types::EntryKind;
/// use layerscan_core::types::FileInfo;
///
/// let data = b"NAME=\"openEuler\"\nVERSION_ID=\"22.03\"\n";
/// let info = FileInfo {
///     name: "os-release".to_string(),
///     size: data.len() as u64,
///     mode: 0o644,
///     uid: 0,
///     gid: 0,
///     modified: None,
///     kind: EntryKind::Regular,
///     link_target: None,
/// };
///
/// let mut body: &[u8] = data;
/// let accessor = ContentAccessor::from_stream("etc/os-release", info.size, &mut body);
///
/// let group = AnalyzerGroup::with_defaults();
/// let mut result = AnalysisResult::default();
/// group.analyze_file(&mut result, "etc/os-release", &info, &accessor)?;
///
/// let os = result.os.unwrap();
/// assert_eq!(os.family, "openEuler");
/// assert_eq!(os.name, "22.03");
/// # Ok::<(), layerscan_core::WalkError>(())
/// ```
#[derive(Default)]
pub struct AnalyzerGroup {
    analyzers: Vec<Box<dyn Analyzer>>,
}

impl AnalyzerGroup {
    /// Creates an empty group.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a group with the built-in analyzers.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut group = Self::new();
        group.register(OpenEulerAnalyzer);
        group.register(OsReleaseAnalyzer);
        group
    }

    /// Appends an analyzer.
    pub fn register(&mut self, analyzer: impl Analyzer + 'static) {
        self.analyzers.push(Box::new(analyzer));
    }

    /// Number of registered analyzers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    /// Returns `true` if no analyzer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }

    /// Type and version of every registered analyzer, in registration order.
    #[must_use]
    pub fn versions(&self) -> Vec<(AnalyzerType, u32)> {
        self.analyzers
            .iter()
            .map(|a| (a.analyzer_type(), a.version()))
            .collect()
    }

    /// Runs every analyzer interested in the entry and merges their results
    /// into `result`.
    ///
    /// Analyzers run on scoped threads, each opening the accessor on its own.
    /// An analyzer that fails is logged and ignored; failing to access the
    /// content aborts. Materialized content is released once every analyzer
    /// has finished.
    ///
    /// # Errors
    ///
    /// Returns the first content access error, or an I/O error if releasing
    /// spooled content fails.
    pub fn analyze_file(
        &self,
        result: &mut AnalysisResult,
        path: &str,
        info: &FileInfo,
        accessor: &ContentAccessor<'_>,
    ) -> Result<()> {
        let required: Vec<&dyn Analyzer> = self
            .analyzers
            .iter()
            .map(|a| &**a)
            .filter(|a| a.required(path, info))
            .collect();

        let outcomes: Vec<Result<(AnalysisResult, Release)>> = match required.as_slice() {
            [] => return Ok(()),
            [single] => vec![run_analyzer(*single, path, info, accessor)],
            _ => thread::scope(|scope| {
                let handles: Vec<_> = required
                    .iter()
                    .map(|analyzer| scope.spawn(move || run_analyzer(*analyzer, path, info, accessor)))
                    .collect();
                handles
                    .into_iter()
                    .map(|h| h.join().unwrap_or_else(|payload| std::panic::resume_unwind(payload)))
                    .collect()
            }),
        };

        let mut first_error: Option<WalkError> = None;
        let mut releases = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                Ok((analysis, release)) => {
                    result.merge(analysis);
                    releases.push(release);
                }
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        for release in releases {
            if let Err(e) = release.release() {
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for AnalyzerGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.analyzers.iter().map(|a| a.analyzer_type()))
            .finish()
    }
}

fn run_analyzer(
    analyzer: &dyn Analyzer,
    path: &str,
    info: &FileInfo,
    accessor: &ContentAccessor<'_>,
) -> Result<(AnalysisResult, Release)> {
    let (mut reader, release) = accessor.open()?;
    let input = AnalysisInput {
        path,
        info,
        content: &mut reader,
    };

    match analyzer.analyze(input) {
        Ok(analysis) => Ok((analysis, release)),
        Err(e) => {
            tracing::debug!(
                analyzer = %analyzer.analyzer_type(),
                path,
                error = %e,
                "analysis failed"
            );
            Ok((AnalysisResult::default(), release))
        }
    }
}
