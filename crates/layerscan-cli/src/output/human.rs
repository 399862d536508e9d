//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use super::formatter::SourceKind;
use crate::progress::humanize_bytes;
use anyhow::Result;
use console::Term;
use console::style;
use layerscan_core::EntryKind;
use layerscan_core::LayerReport;
use std::path::Path;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    fn format_number(n: usize) -> String {
        let s = n.to_string();
        let mut result = String::new();
        let mut count = 0;

        for c in s.chars().rev() {
            if count == 3 {
                result.push(',');
                count = 0;
            }
            result.push(c);
            count += 1;
        }

        result.chars().rev().collect()
    }

    const fn type_char(kind: EntryKind) -> char {
        match kind {
            EntryKind::Directory => 'd',
            EntryKind::Regular => '-',
            EntryKind::Symlink => 'l',
            EntryKind::Hardlink => 'h',
            EntryKind::Other => '?',
        }
    }

    fn write_section(&self, title: &str, paths: &[String]) {
        if paths.is_empty() {
            return;
        }

        let _ = self.term.write_line("");
        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{}", style(title).yellow().bold()));
        } else {
            let _ = self.term.write_line(title);
        }
        for path in paths {
            let _ = self.term.write_line(&format!("  - {path}"));
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_report(
        &self,
        kind: SourceKind,
        source: &Path,
        report: &LayerReport,
        list: bool,
    ) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        if list {
            for entry in &report.entries {
                let _ = self.term.write_line(&format!(
                    "{} {:>10}  {}",
                    Self::type_char(entry.kind),
                    entry.size,
                    entry.path
                ));
            }
            let _ = self.term.write_line("");
        }

        let heading = match kind {
            SourceKind::Layer => "Layer inspected",
            SourceKind::Filesystem => "Filesystem inspected",
        };
        if self.use_colors {
            let _ = self.term.write_line(&format!(
                "{} {heading}: {}",
                style("✓").green().bold(),
                source.display()
            ));
        } else {
            let _ = self
                .term
                .write_line(&format!("{heading}: {}", source.display()));
        }

        if let Some(codec) = report.compression {
            let _ = self
                .term
                .write_line(&format!("  Compression:      {codec}"));
        }
        let _ = self.term.write_line(&format!(
            "  Files:            {}",
            Self::format_number(report.files)
        ));
        let _ = self.term.write_line(&format!(
            "  Directories:      {}",
            Self::format_number(report.directories)
        ));
        if report.symlinks > 0 || self.verbose {
            let _ = self.term.write_line(&format!(
                "  Symlinks:         {}",
                Self::format_number(report.symlinks)
            ));
        }
        if report.hardlinks > 0 || self.verbose {
            let _ = self.term.write_line(&format!(
                "  Hard links:       {}",
                Self::format_number(report.hardlinks)
            ));
        }
        let _ = self.term.write_line(&format!(
            "  Total size:       {}",
            humanize_bytes(report.bytes)
        ));
        if let Some(os) = &report.os {
            let _ = self
                .term
                .write_line(&format!("  OS:               {} {}", os.family, os.name));
        }
        if self.verbose {
            let _ = self
                .term
                .write_line(&format!("  Duration:         {:?}", report.duration));
        }

        self.write_section("Opaque directories:", &report.opaque_dirs);
        self.write_section("Deleted paths:", &report.whiteout_files);

        Ok(())
    }

    fn format_warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {message}", style("⚠").yellow().bold()));
        } else {
            let _ = self.term.write_line(&format!("WARNING: {message}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(HumanFormatter::format_number(0), "0");
        assert_eq!(HumanFormatter::format_number(999), "999");
        assert_eq!(HumanFormatter::format_number(1000), "1,000");
        assert_eq!(HumanFormatter::format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn test_type_char() {
        assert_eq!(HumanFormatter::type_char(EntryKind::Directory), 'd');
        assert_eq!(HumanFormatter::type_char(EntryKind::Regular), '-');
        assert_eq!(HumanFormatter::type_char(EntryKind::Symlink), 'l');
        assert_eq!(HumanFormatter::type_char(EntryKind::Hardlink), 'h');
    }
}
