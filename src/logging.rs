//! Diagnostic tracing for the binary.
//!
//! This is separate from the command trace: command events go to the
//! `LogSink` of each result; this subscriber only carries the crate's own
//! diagnostics (skipped lines, unclosed traces) to stderr.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the stderr subscriber. Reads `RUST_LOG`, defaulting to `warn`.
///
/// ```bash
/// RUST_LOG=cmdtrace=debug cmdtrace pretty --log app.log
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
