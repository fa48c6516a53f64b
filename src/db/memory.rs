use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::SessionStore;
use crate::{error::Result, models::Session};

/// Process-local session table. Everything is lost on restart.
#[derive(Clone)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl_secs: u64,
}

impl MemorySessionStore {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl_secs,
        }
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, token: &str, session: Session) -> Result<bool> {
        let mut sessions = self.sessions.write().await;
        let now = Self::now();
        if let Some(existing) = sessions.get(token) {
            if !existing.is_expired(now, self.ttl_secs) {
                return Ok(false);
            }
        }
        sessions.insert(token.to_string(), session);
        Ok(true)
    }

    async fn get(&self, token: &str) -> Result<Option<Session>> {
        let sessions = self.sessions.read().await;
        let now = Self::now();
        Ok(sessions
            .get(token)
            .filter(|s| !s.is_expired(now, self.ttl_secs))
            .cloned())
    }

    async fn set(&self, token: &str, session: Session) -> Result<bool> {
        let mut sessions = self.sessions.write().await;
        let now = Self::now();
        match sessions.get_mut(token) {
            Some(existing) if !existing.is_expired(now, self.ttl_secs) => {
                let created_at = existing.created_at;
                *existing = Session {
                    created_at,
                    ..session
                };
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remove(&self, token: &str) -> Result<()> {
        self.sessions.write().await.remove(token);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize> {
        let mut sessions = self.sessions.write().await;
        let now = Self::now();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now, self.ttl_secs));
        Ok(before - sessions.len())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
