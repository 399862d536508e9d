//! Layer command implementation

use crate::cli::LayerArgs;
use crate::error::add_source_context;
use crate::output::OutputFormatter;
use crate::output::SourceKind;
use crate::progress::CliProgress;
use anyhow::Result;
use layerscan_core::inspect_layer_with_progress;

pub fn execute(args: &LayerArgs, formatter: &dyn OutputFormatter, silent: bool) -> Result<()> {
    let config = args.skip.to_config();
    tracing::debug!(layer = %args.layer.display(), ?config, "inspecting layer");

    let mut progress = if !silent && CliProgress::should_show() {
        CliProgress::new("Inspecting")
    } else {
        CliProgress::hidden()
    };

    let report = add_source_context(
        inspect_layer_with_progress(&args.layer, &config, &mut progress),
        &args.layer,
    )?;
    drop(progress);

    if report.total_entries() == 0 && !report.has_deletions() {
        formatter.format_warning("layer contains no inspectable entries");
    }

    formatter.format_report(SourceKind::Layer, &args.layer, &report, args.list)
}
