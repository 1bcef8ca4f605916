//! Tracing bootstrap for test processes.
//!
//! Test binaries have no `main`, so each harness calls [`init_tracing`]
//! before doing work. Only the first call installs a subscriber.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "isolator=info,isolator_router=info,tower_http=warn";

/// Install the global tracing subscriber.
///
/// Honours `RUST_LOG`, falling back to `default_filter`. Output goes through
/// the test writer so it is captured per test by the harness.
///
/// Returns `true` if this call installed the subscriber.
pub fn init_tracing(default_filter: &str) -> bool {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init()
        .is_ok()
}
