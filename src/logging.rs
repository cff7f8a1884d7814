//! Tracing subscriber setup
//!
//! The library itself only emits `tracing` events; binaries and test
//! fixtures call [`init`] once to get console output.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber honouring `RUST_LOG`, falling back to `level`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init(level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
