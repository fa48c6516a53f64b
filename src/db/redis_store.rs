use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};

use super::SessionStore;
use crate::{
    constants::REDIS_SESSION_KEY_PREFIX,
    error::{AppError, Result},
    models::Session,
};

/// Redis-backed sessions. Expiry is handled by Redis key TTLs, so sessions
/// survive restarts and are shared between instances.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
    ttl_secs: u64,
}

fn session_key(token: &str) -> String {
    format!("{}{}", REDIS_SESSION_KEY_PREFIX, token)
}

fn encode_session(session: &Session) -> Result<String> {
    serde_json::to_string(session)
        .map_err(|e| AppError::Internal(format!("Session encode failed: {}", e)))
}

fn decode_session(raw: &str) -> Result<Session> {
    serde_json::from_str(raw)
        .map_err(|e| AppError::Internal(format!("Session decode failed: {}", e)))
}

impl RedisSessionStore {
    pub async fn connect(redis_url: &str, ttl_secs: u64) -> anyhow::Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn, ttl_secs })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn create(&self, token: &str, session: Session) -> Result<bool> {
        let mut conn = self.conn.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(session_key(token))
            .arg(encode_session(&session)?)
            .arg("NX")
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn get(&self, token: &str) -> Result<Option<Session>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(session_key(token)).await?;
        raw.as_deref().map(decode_session).transpose()
    }

    async fn set(&self, token: &str, session: Session) -> Result<bool> {
        let mut conn = self.conn.clone();
        let key = session_key(token);
        let existing: Option<String> = conn.get(&key).await?;
        let created_at = match existing {
            Some(raw) => decode_session(&raw)?.created_at,
            None => return Ok(false),
        };
        let reply: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(encode_session(&Session {
                created_at,
                ..session
            })?)
            .arg("XX")
            .arg("KEEPTTL")
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn remove(&self, token: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(session_key(token)).await?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize> {
        // Redis expires keys itself.
        Ok(0)
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
