//! Diagnostic logging setup.

use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence; otherwise the level is `warn`, raised to
/// `debug` by `--verbose` and lowered to `error` by `--quiet`.
pub fn init(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "layerscan_core=debug,layerscan=debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A subscriber may already be installed when embedded in tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
