//! Tracing setup for test binaries

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install a tracing subscriber that writes through the test harness.
///
/// Honours `RUST_LOG`, defaulting to `info` with debug output for this
/// crate. Safe to call from every test: only the first call installs the
/// subscriber.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,miia_test_utils=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}
