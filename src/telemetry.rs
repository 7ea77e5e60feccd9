//! Log output for the binaries.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber: `RUST_LOG` filtering (default `info`), no module target
/// and no timestamp, since CloudWatch stamps each line on ingestion.
///
/// Does nothing if a subscriber is already installed.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .try_init();
}
