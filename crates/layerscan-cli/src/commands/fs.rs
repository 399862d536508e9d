//! Filesystem command implementation

use crate::cli::FsArgs;
use crate::error::add_source_context;
use crate::output::OutputFormatter;
use crate::output::SourceKind;
use crate::progress::CliProgress;
use anyhow::Result;
use anyhow::bail;
use layerscan_core::inspect_filesystem_with_progress;

pub fn execute(args: &FsArgs, formatter: &dyn OutputFormatter, silent: bool) -> Result<()> {
    if args.root.is_file() {
        bail!(
            "'{}' is a file, not a directory\n\
             HINT: Use `layerscan layer` to inspect a layer blob.",
            args.root.display()
        );
    }

    let config = args.skip.to_config();
    tracing::debug!(root = %args.root.display(), ?config, "inspecting filesystem");

    let mut progress = if !silent && CliProgress::should_show() {
        CliProgress::new("Inspecting")
    } else {
        CliProgress::hidden()
    };

    let report = add_source_context(
        inspect_filesystem_with_progress(&args.root, &config, &mut progress),
        &args.root,
    )?;
    drop(progress);

    if report.total_entries() == 0 {
        formatter.format_warning("no files found below the root");
    }

    formatter.format_report(SourceKind::Filesystem, &args.root, &report, args.list)
}
