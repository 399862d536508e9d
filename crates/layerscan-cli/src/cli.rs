//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use clap_complete::Shell;
use layerscan_core::WalkConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "layerscan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect a container image layer blob
    Layer(LayerArgs),
    /// Inspect a local directory tree
    #[command(visible_alias = "filesystem")]
    Fs(FsArgs),
    /// Generate shell completions
    Completion(CompletionArgs),
}

#[derive(clap::Args)]
pub struct LayerArgs {
    /// Path to the layer blob (tar, tar.gz or tar.zst)
    #[arg(value_name = "LAYER")]
    pub layer: PathBuf,

    #[command(flatten)]
    pub skip: SkipArgs,

    /// List every delivered entry
    #[arg(short, long)]
    pub list: bool,
}

#[derive(clap::Args)]
pub struct FsArgs {
    /// Root directory to inspect
    #[arg(value_name = "DIR")]
    pub root: PathBuf,

    #[command(flatten)]
    pub skip: SkipArgs,

    /// List every delivered file
    #[arg(short, long)]
    pub list: bool,
}

#[derive(clap::Args)]
pub struct CompletionArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Skip policy flags shared by the inspection commands.
#[derive(clap::Args)]
pub struct SkipArgs {
    /// Skip files matching PATTERN (exact path, `prefix*` or `*suffix`;
    /// comma-separated, can be repeated)
    #[arg(long = "skip-files", value_name = "PATTERN", value_delimiter = ',')]
    pub skip_files: Vec<String>,

    /// Skip directories matching PATTERN and everything below them
    /// (comma-separated, can be repeated)
    #[arg(long = "skip-dirs", value_name = "PATTERN", value_delimiter = ',')]
    pub skip_dirs: Vec<String>,

    /// Do not apply the built-in skip list (proc, sys, dev, .git)
    #[arg(long)]
    pub no_default_skips: bool,
}

impl SkipArgs {
    /// Builds the walk configuration, appending user patterns to the
    /// built-in policy unless it is disabled.
    pub fn to_config(&self) -> WalkConfig {
        let base = if self.no_default_skips {
            WalkConfig::empty()
        } else {
            WalkConfig::default()
        };

        let skip_files = base
            .skip_files
            .iter()
            .chain(&self.skip_files)
            .map(|p| normalize_pattern(p))
            .filter(|p| !p.is_empty())
            .collect();
        let skip_dirs = base
            .skip_dirs
            .iter()
            .chain(&self.skip_dirs)
            .map(|p| normalize_pattern(p))
            .filter(|p| !p.is_empty())
            .collect();

        base.with_skip_files(skip_files).with_skip_dirs(skip_dirs)
    }
}

/// Trims whitespace and a leading `/` so patterns match normalized paths.
fn normalize_pattern(pattern: &str) -> String {
    pattern.trim().trim_start_matches('/').to_string()
}
