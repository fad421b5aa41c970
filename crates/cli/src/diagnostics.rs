//! crates/cli/src/diagnostics.rs
//! Diagnostics of scriptlog itself, kept apart from the records it sends.

use std::io;

use tracing_subscriber::EnvFilter;

/// Filter directives for scriptlog's own diagnostics, in `EnvFilter` syntax.
pub const ENV_DIAG: &str = "SCRIPTLOG_DIAG";

/// Directive used when [`ENV_DIAG`] is unset or invalid.
pub const DEFAULT_DIAG_FILTER: &str = "warn";

/// Installs a `tracing` subscriber that writes to standard error.
///
/// Calling it more than once is harmless; only the first call installs.
pub fn init_diagnostics() {
    let filter = EnvFilter::try_from_env(ENV_DIAG)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIAG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
