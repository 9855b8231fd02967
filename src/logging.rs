//! Diagnostic logging.
//!
//! Operator output never goes through `tracing`; this subscriber only carries
//! debug and trace events, written to stderr.

use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding the filter directive, e.g. `sortdir=debug`.
pub const LOG_ENV: &str = "SORTDIR_LOG";

const DEFAULT_LOG_LEVEL: &str = "warn";

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging() {
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    let _ = fmt::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
