//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Initialize logging for the process.
///
/// The filter comes from `RUST_LOG`, defaulting to `info`; storage and log
/// internals emit at `debug`/`trace` and stay quiet unless asked for.
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .with_target(false)
        .try_init();
}
