//! Tracing setup for tests

use once_cell::sync::Lazy;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "ward=debug";

static TRACING: Lazy<()> = Lazy::new(|| {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    // Another harness may already have installed a global subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
});

/// Install the test subscriber once per process
pub fn init_test_tracing() {
    Lazy::force(&TRACING);
}
