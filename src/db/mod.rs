// Session storage behind a swappable backend.

pub mod memory;
pub mod redis_store;

use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    config::{Config, SessionBackend},
    constants::SESSION_TOKEN_BYTES,
    error::Result,
    models::Session,
};

pub use memory::MemorySessionStore;
pub use redis_store::RedisSessionStore;

/// Mints an unguessable session token: 256 random bits as lowercase hex.
pub fn generate_session_token() -> String {
    hex::encode(rand::random::<[u8; SESSION_TOKEN_BYTES]>())
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Inserts a new session. Returns `false` if the token is already taken.
    async fn create(&self, token: &str, session: Session) -> Result<bool>;

    /// Returns the live session for `token`, or `None` if unknown or expired.
    async fn get(&self, token: &str) -> Result<Option<Session>>;

    /// Replaces an existing session, keeping its expiry. Returns `false` if
    /// the token is unknown or expired.
    async fn set(&self, token: &str, session: Session) -> Result<bool>;

    async fn remove(&self, token: &str) -> Result<()>;

    /// Evicts expired sessions and returns how many were dropped.
    async fn purge_expired(&self) -> Result<usize>;

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str;
}

pub async fn connect(config: &Config) -> anyhow::Result<Arc<dyn SessionStore>> {
    match config.session_backend {
        SessionBackend::Memory => {
            tracing::info!("Session store: in-memory (sessions are lost on restart)");
            Ok(Arc::new(MemorySessionStore::new(config.session_ttl_secs)))
        }
        SessionBackend::Redis => {
            tracing::info!("Session store: redis");
            let store =
                RedisSessionStore::connect(&config.redis_url, config.session_ttl_secs).await?;
            Ok(Arc::new(store))
        }
    }
}
