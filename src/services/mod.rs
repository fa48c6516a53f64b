// All service modules
pub mod continue_service;
pub mod score_relay;
pub mod session_sweeper;

// Re-export for convenience
pub use continue_service::{ContinueService, PurchasePolicy};
pub use score_relay::ScoreRelay;
pub use session_sweeper::SessionSweeper;

use crate::{
    config::{Config, SessionBackend},
    db::SessionStore,
};
use std::sync::Arc;
use std::time::Duration;

/// Redis expires session keys on its own; only the memory store needs sweeping.
fn sweeper_enabled(config: &Config) -> bool {
    config.session_backend == SessionBackend::Memory && config.session_sweep_interval_secs > 0
}

/// Start all background services
pub async fn start_background_services(sessions: Arc<dyn SessionStore>, config: Config) {
    tracing::info!("Starting background services...");

    if sweeper_enabled(&config) {
        let sweeper = Arc::new(SessionSweeper::new(
            sessions,
            Duration::from_secs(config.session_sweep_interval_secs),
        ));
        sweeper.start().await;
    } else if config.session_backend == SessionBackend::Redis {
        tracing::info!("Session sweeper not started: redis expires sessions natively");
    } else {
        tracing::warn!("Session sweeper disabled via SESSION_SWEEP_INTERVAL_SECS=0");
    }

    tracing::info!("All background services started successfully");
}
