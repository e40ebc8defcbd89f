//! Diagnostic logging setup.
//!
//! Diagnostics go to stderr through `tracing`; stdout is reserved for
//! command output (reports, JSON). The filter comes from `RUST_LOG` and
//! defaults to `smca=info`.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "smca=info";

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
