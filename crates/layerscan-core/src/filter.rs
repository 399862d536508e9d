//! Skip policy evaluation for walked entries.
//!
//! This module decides which files and directories are excluded from
//! delivery, and whether an entry sits below a directory that was already
//! excluded earlier in the same walk.

use crate::WalkConfig;
use crate::path;

/// Evaluates the configured skip policy against normalized entry paths.
///
/// # Examples
///
/// ```
/// use layerscan_core::WalkConfig;
/// use layerscan_core::filter::SkipFilter;
///
/// let config = WalkConfig::empty()
///     .with_skip_dirs(vec!["/usr/share/doc".to_string()])
///     .with_skip_files(vec!["*.pyc".to_string()]);
/// let filter = SkipFilter::new(&config);
///
/// assert!(filter.should_skip_dir("usr/share/doc"));
/// assert!(filter.should_skip_file("app/__pycache__/main.cpython-311.pyc"));
/// assert!(!filter.should_skip_file("app/main.py"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SkipFilter {
    skip_files: Vec<String>,
    skip_dirs: Vec<String>,
    ignored_dir_names: Vec<String>,
}

impl SkipFilter {
    /// Builds a filter, normalizing every configured pattern the same way
    /// entry paths are normalized.
    #[must_use]
    pub fn new(config: &WalkConfig) -> Self {
        Self {
            skip_files: config.skip_files.iter().map(|p| normalize_pattern(p)).collect(),
            skip_dirs: config.skip_dirs.iter().map(|p| normalize_pattern(p)).collect(),
            ignored_dir_names: config.ignored_dir_names.clone(),
        }
    }

    /// Returns `true` if the directory at `dir` must be skipped.
    #[must_use]
    pub fn should_skip_dir(&self, dir: &str) -> bool {
        let dir = dir.trim_start_matches('/');

        let (_, base) = path::split(dir);
        if self.ignored_dir_names.iter().any(|name| name == base) {
            return true;
        }

        self.skip_dirs.iter().any(|pattern| pattern_matches(dir, pattern))
    }

    /// Returns `true` if the file at `file_path` must be skipped.
    #[must_use]
    pub fn should_skip_file(&self, file_path: &str) -> bool {
        let file_path = file_path.trim_start_matches('/');
        self.skip_files
            .iter()
            .any(|pattern| pattern_matches(file_path, pattern))
    }
}

/// Returns `true` if `file_path` lies at or below any directory in
/// `skip_dirs`.
///
/// Directories whose relative path to `file_path` cannot be computed are
/// treated as non-matching and the remaining directories are still checked.
///
/// # Examples
///
/// ```
/// use layerscan_core::filter::under_skipped_dir;
///
/// let skipped = vec!["node_modules".to_string()];
/// assert!(under_skipped_dir("node_modules/pkg/index.js", &skipped));
/// assert!(under_skipped_dir("node_modules", &skipped));
/// assert!(!under_skipped_dir("node_modules2/index.js", &skipped));
/// assert!(!under_skipped_dir("src/index.js", &skipped));
/// ```
#[must_use]
pub fn under_skipped_dir(file_path: &str, skip_dirs: &[String]) -> bool {
    skip_dirs.iter().any(|skip_dir| {
        path::relative(skip_dir, file_path)
            .is_some_and(|rel| rel != ".." && !rel.starts_with("../"))
    })
}

fn normalize_pattern(pattern: &str) -> String {
    path::normalize(pattern)
}

/// Matches a path against an exact, prefix (`foo*`) or suffix (`*foo`)
/// pattern.
fn pattern_matches(s: &str, pattern: &str) -> bool {
    if pattern == s {
        return true;
    }

    if let Some(prefix) = pattern.strip_suffix('*') {
        return s.starts_with(prefix);
    }

    if let Some(suffix) = pattern.strip_prefix('*') {
        return s.ends_with(suffix);
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(skip_files: &[&str], skip_dirs: &[&str]) -> SkipFilter {
        let config = WalkConfig::empty()
            .with_skip_files(skip_files.iter().map(ToString::to_string).collect())
            .with_skip_dirs(skip_dirs.iter().map(ToString::to_string).collect());
        SkipFilter::new(&config)
    }

    #[test]
    fn test_skip_file_exact() {
        let f = filter(&["etc/shadow"], &[]);
        assert!(f.should_skip_file("etc/shadow"));
        assert!(f.should_skip_file("/etc/shadow"));
        assert!(!f.should_skip_file("etc/shadow-"));
        assert!(!f.should_skip_file("etc/passwd"));
    }

    #[test]
    fn test_skip_patterns_are_normalized() {
        let f = filter(&["/etc//shadow"], &["./var/cache/"]);
        assert!(f.should_skip_file("etc/shadow"));
        assert!(f.should_skip_dir("var/cache"));
    }

    #[test]
    fn test_skip_file_prefix_and_suffix() {
        let f = filter(&["usr/share/doc/*", "*.pyc"], &[]);
        assert!(f.should_skip_file("usr/share/doc/bash/README"));
        assert!(f.should_skip_file("lib/python3/foo.pyc"));
        assert!(!f.should_skip_file("usr/share/man/man1/ls.1"));
    }

    #[test]
    fn test_skip_dir_exact() {
        let f = filter(&[], &["node_modules"]);
        assert!(f.should_skip_dir("node_modules"));
        assert!(!f.should_skip_dir("app/node_modules"));
    }

    #[test]
    fn test_default_system_dirs() {
        let f = SkipFilter::new(&WalkConfig::default());
        assert!(f.should_skip_dir("proc"));
        assert!(f.should_skip_dir("/sys"));
        assert!(f.should_skip_dir("dev"));
        assert!(!f.should_skip_dir("usr/dev"));
    }

    #[test]
    fn test_ignored_dir_names_match_any_depth() {
        let f = SkipFilter::new(&WalkConfig::default());
        assert!(f.should_skip_dir(".git"));
        assert!(f.should_skip_dir("src/app/.git"));
        assert!(!f.should_skip_dir("src/app/.github"));
    }

    #[test]
    fn test_empty_filter_skips_nothing() {
        let f = SkipFilter::new(&WalkConfig::empty());
        assert!(!f.should_skip_dir("proc"));
        assert!(!f.should_skip_file("etc/shadow"));
    }

    #[test]
    fn test_under_skipped_dir_self_and_children() {
        let dirs = vec!["var/cache".to_string()];
        assert!(under_skipped_dir("var/cache", &dirs));
        assert!(under_skipped_dir("var/cache/apk/APKINDEX", &dirs));
        assert!(!under_skipped_dir("var/lib/apk", &dirs));
    }

    #[test]
    fn test_under_skipped_dir_parent_is_not_under() {
        let dirs = vec!["var/cache".to_string()];
        assert!(!under_skipped_dir("var", &dirs));
    }

    #[test]
    fn test_under_skipped_dir_continues_after_incomparable() {
        // The first directory cannot be related to a relative path; the
        // second one still matches.
        let dirs = vec!["/abs".to_string(), "opt".to_string()];
        assert!(under_skipped_dir("opt/app/bin", &dirs));
        assert!(!under_skipped_dir("abs/file", &dirs));
    }

    #[test]
    fn test_under_skipped_dir_empty_set() {
        assert!(!under_skipped_dir("anything", &[]));
    }

    #[test]
    fn test_pattern_matches() {
        assert!(pattern_matches("test", "test"));
        assert!(pattern_matches("testing", "test*"));
        assert!(pattern_matches("a.txt", "*.txt"));
        assert!(!pattern_matches("atest", "test*"));
        assert!(!pattern_matches("txt", "*.txt"));
    }
}
