//! Tracing subscriber bootstrap shared by both binaries.

use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the JSON subscriber filtered by `RUST_LOG`.
///
/// A subscriber that is already installed is left in place.
pub fn init_tracing() {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }
}
