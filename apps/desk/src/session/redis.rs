use std::time::Duration;

use ::redis::aio::MultiplexedConnection;
use async_trait::async_trait;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::session::{Session, SessionPatch, SessionStore};
use crate::transport::UserId;

/// Sessions as JSON strings in Redis, expiring after `ttl` without a write.
///
/// `merge` is a read followed by a write. Events for one operator arrive one
/// after another, so nothing else writes the key in between.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: MultiplexedConnection,
    ttl: Duration,
}

impl RedisSessionStore {
    pub async fn connect(redis_url: &str, ttl: Duration) -> anyhow::Result<Self> {
        let client = ::redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        info!("Redis session store connected");
        Ok(Self { conn, ttl })
    }

    fn key(user_id: UserId) -> String {
        format!("desk:session:{user_id}")
    }

    async fn write(&self, user_id: UserId, session: &Session) -> Result<(), AppError> {
        let payload = serde_json::to_string(session)?;
        let mut conn = self.conn.clone();
        ::redis::cmd("SET")
            .arg(Self::key(user_id))
            .arg(payload)
            .arg("EX")
            .arg(self.ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut conn)
            .await?;
        debug!(user_id, step = ?session.step, "session stored");
        Ok(())
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, user_id: UserId) -> Result<Option<Session>, AppError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = ::redis::cmd("GET")
            .arg(Self::key(user_id))
            .query_async(&mut conn)
            .await?;
        Ok(raw.map(|s| serde_json::from_str::<Session>(&s)).transpose()?)
    }

    async fn set(&self, user_id: UserId, session: Session) -> Result<(), AppError> {
        self.write(user_id, &session).await
    }

    async fn merge(&self, user_id: UserId, patch: SessionPatch) -> Result<Session, AppError> {
        let mut session = self.get(user_id).await?.unwrap_or_default();
        session.apply(patch);
        self.write(user_id, &session).await?;
        Ok(session)
    }

    async fn clear(&self, user_id: UserId) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        ::redis::cmd("DEL")
            .arg(Self::key(user_id))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }
}
