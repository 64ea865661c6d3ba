//! Tracing subscriber setup.
//!
//! The level follows the `-v`/`-q` counts; `QUARTET_LOG` takes an
//! `EnvFilter` directive string and wins when set.

use tracing_subscriber::EnvFilter;

/// Environment variable holding a filter directive.
pub const LOG_ENV: &str = "QUARTET_LOG";

/// Default directive for a verbosity setting.
pub fn default_directive(verbose: u8, quiet: u8) -> &'static str {
    match (verbose, quiet) {
        (0, 0) => "warn",
        (0, 1) => "error",
        (0, _) => "off",
        (1, _) => "info",
        (2, _) => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Logs go to stderr so JSON on stdout
/// stays parseable.
pub fn init(verbose: u8, quiet: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
