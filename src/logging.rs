//! Diagnostic logging setup
//!
//! User-facing progress goes to stdout via `println!`; this subscriber only
//! carries `tracing` diagnostics to stderr.

use tracing_subscriber::EnvFilter;

/// Environment variable overriding the log filter, e.g. `CHROME_MIGRATE_LOG=debug`
pub const LOG_ENV: &str = "CHROME_MIGRATE_LOG";

pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    // Ignore a second initialization attempt
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
