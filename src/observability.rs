//! Logging setup

use tracing_subscriber::EnvFilter;

const DEFAULT_LEVEL: &str = "info";

/// Install the global subscriber. `RUST_LOG` wins over `level`.
///
/// Logs go to stderr so stdout only carries run outputs.
pub fn init_tracing(level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.unwrap_or(DEFAULT_LEVEL)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));

    // A second call (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
