//! Walk configuration.

/// Skip policy applied while walking a layer or a filesystem tree.
///
/// Patterns are matched against normalized entry paths (no leading `/`,
/// lexically cleaned). A pattern is either an exact path, a prefix ending in
/// `*` (`usr/share/doc/*`), or a suffix starting with `*` (`*.pyc`).
///
/// # Examples
///
/// ```
/// use layerscan_core::WalkConfig;
///
/// // Built-in policy: system pseudo-filesystems and VCS metadata
/// let config = WalkConfig::default();
/// assert!(config.skip_dirs.iter().any(|d| d == "proc"));
///
/// // Custom policy
/// let custom = WalkConfig::empty()
///     .with_skip_dirs(vec!["node_modules".to_string()])
///     .with_skip_files(vec!["etc/shadow".to_string()]);
/// assert!(custom.ignored_dir_names.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkConfig {
    /// File path patterns excluded from delivery.
    pub skip_files: Vec<String>,

    /// Directory path patterns excluded from delivery, together with
    /// everything below them.
    pub skip_dirs: Vec<String>,

    /// Directory base names skipped wherever they appear.
    pub ignored_dir_names: Vec<String>,
}

impl Default for WalkConfig {
    /// Creates a `WalkConfig` with the built-in skip policy.
    ///
    /// Default values:
    /// - `skip_files`: empty
    /// - `skip_dirs`: `["proc", "sys", "dev"]`
    /// - `ignored_dir_names`: `[".git"]`
    fn default() -> Self {
        Self {
            skip_files: Vec::new(),
            skip_dirs: vec!["proc".to_string(), "sys".to_string(), "dev".to_string()],
            ignored_dir_names: vec![".git".to_string()],
        }
    }
}

impl WalkConfig {
    /// Creates a configuration that skips nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            skip_files: Vec::new(),
            skip_dirs: Vec::new(),
            ignored_dir_names: Vec::new(),
        }
    }

    /// Replaces the skip-file patterns.
    #[must_use]
    pub fn with_skip_files(mut self, patterns: Vec<String>) -> Self {
        self.skip_files = patterns;
        self
    }

    /// Replaces the skip-dir patterns.
    #[must_use]
    pub fn with_skip_dirs(mut self, patterns: Vec<String>) -> Self {
        self.skip_dirs = patterns;
        self
    }

    /// Replaces the ignored directory base names.
    #[must_use]
    pub fn with_ignored_dir_names(mut self, names: Vec<String>) -> Self {
        self.ignored_dir_names = names;
        self
    }
}
