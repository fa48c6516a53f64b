use std::sync::Arc;
use tokio::time::{interval, Duration};

use crate::{db::SessionStore, error::Result};

/// Session Sweeper - evicts expired purchase sessions on a fixed period
pub struct SessionSweeper {
    sessions: Arc<dyn SessionStore>,
    period: Duration,
}

impl SessionSweeper {
    pub fn new(sessions: Arc<dyn SessionStore>, period: Duration) -> Self {
        Self { sessions, period }
    }

    /// Start sweep loop
    pub async fn start(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut ticker = interval(self.period);

            loop {
                ticker.tick().await;

                if let Err(e) = self.sweep_once().await {
                    tracing::error!("Session sweeper error: {}", e);
                }
            }
        });
    }

    async fn sweep_once(&self) -> Result<usize> {
        let evicted = self.sessions.purge_expired().await?;
        if evicted > 0 {
            tracing::debug!("Evicted {} expired sessions", evicted);
        }
        Ok(evicted)
    }
}
