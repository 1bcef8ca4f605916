//! Session sweeper background task.
//!
//! Periodically evicts registry sessions that have seen no registration or
//! lookup within the configured TTL. Sessions normally end through explicit
//! teardown when a test session is dropped; the sweeper bounds registry growth
//! in long-lived shared processes where that teardown never ran.
//!
//! # Graceful Shutdown
//!
//! The task supports graceful shutdown via a cancellation token. When the token
//! is cancelled, the task completes its current iteration and exits cleanly.

use isolator_common::config::{DEFAULT_SESSION_TTL_SECONDS, DEFAULT_SWEEP_INTERVAL_SECONDS};
use isolator_common::{Config, MockRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Configuration for the session sweeper task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSweeperConfig {
    /// How often to sweep.
    pub check_interval: Duration,
    /// Idle time after which a session is evicted.
    pub session_ttl: Duration,
}

impl Default for SessionSweeperConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECONDS),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECONDS),
        }
    }
}

impl From<&Config> for SessionSweeperConfig {
    fn from(config: &Config) -> Self {
        Self {
            check_interval: config.sweep_interval,
            session_ttl: config.session_ttl,
        }
    }
}

/// Start the session sweeper background task.
///
/// # Arguments
///
/// * `registry` - Registry shared with the routing layer and test sessions
/// * `config` - Sweep interval and session TTL
/// * `cancel_token` - Token for graceful shutdown
///
/// # Returns
///
/// Returns when the cancellation token is triggered.
#[instrument(skip_all, name = "isolator.task.session_sweeper")]
pub async fn start_session_sweeper(
    registry: Arc<MockRegistry>,
    config: SessionSweeperConfig,
    cancel_token: CancellationToken,
) {
    info!(
        target: "isolator.task.session_sweeper",
        check_interval_ms = u64::try_from(config.check_interval.as_millis()).unwrap_or(u64::MAX),
        session_ttl_secs = config.session_ttl.as_secs(),
        "Starting session sweeper task"
    );

    let mut interval = tokio::time::interval(config.check_interval);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                run_sweep(&registry, &config);
            }
            _ = cancel_token.cancelled() => {
                info!(
                    target: "isolator.task.session_sweeper",
                    "Session sweeper task received shutdown signal, exiting"
                );
                break;
            }
        }
    }

    info!(
        target: "isolator.task.session_sweeper",
        "Session sweeper task stopped"
    );
}

/// Run a single sweep iteration. Returns the number of evicted sessions.
pub(crate) fn run_sweep(registry: &MockRegistry, config: &SessionSweeperConfig) -> usize {
    let evicted = registry.evict_idle(config.session_ttl);
    if evicted > 0 {
        info!(
            target: "isolator.task.session_sweeper",
            evicted,
            remaining = registry.session_count(),
            "Swept idle sessions"
        );
    }
    evicted
}
