//! Diagnostic logging setup
//!
//! Logs go to stderr so command output on stdout stays machine-readable.
//! The filter comes from `ARCHFIX_LOG` (same syntax as `RUST_LOG`); without
//! it only warnings are shown, or debug output with `--verbose`.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "ARCHFIX_LOG";

/// Default filter directive
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "archfix=debug,warn" } else { "warn" }
}

/// Install the global subscriber; later calls are no-ops
pub fn init(verbose: bool) {
    let default_level = default_directive(verbose);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV)
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
