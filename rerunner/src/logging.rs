//! Development-time tracing for debugging engine runs.
//!
//! Diagnostics go to stderr via `RUST_LOG`; product output (the final
//! failed-process count) is printed to stdout by the CLI and is unaffected
//! by the subscriber configuration.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber for development logging.
///
/// Reads `RUST_LOG`. Defaults to `warn` if unset. Output: stderr, compact
/// format.
///
/// # Example
/// ```bash
/// RUST_LOG=rerunner=debug rerunner --specs-dir ./specs
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
