//! Logging setup
//!
//! `RUST_LOG` wins when set; otherwise the CLI verbosity picks the level.

use tracing_subscriber::EnvFilter;

use crate::cli::Verbosity;

/// Default filter directive for a verbosity level
pub fn default_directive(verbosity: Verbosity) -> &'static str {
    match verbosity {
        Verbosity::Quiet => "warn",
        Verbosity::Normal => "planetary_ai=info,warn",
        Verbosity::Verbose => "planetary_ai=debug,info",
        Verbosity::VeryVerbose => "trace",
    }
}

/// Install the global subscriber (logs go to stderr)
pub fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
