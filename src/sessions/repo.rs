use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::sessions::repo_types::{NewSession, Session};

/// Bookkeeping over `user_sessions`. Nothing here takes part in authorization.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, new: NewSession) -> anyhow::Result<Session>;
    /// Removes the row with this token; `false` when there was none.
    async fn delete(&self, session_token: &str) -> anyhow::Result<bool>;
    async fn list_for_user(&self, user_id: i64) -> anyhow::Result<Vec<Session>>;
}

#[derive(Clone)]
pub struct PgSessionStore {
    db: PgPool,
}

impl PgSessionStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, new: NewSession) -> anyhow::Result<Session> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO user_sessions (user_id, session_token, ip_address, user_agent, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, session_token, ip_address, user_agent, expires_at, created_at
            "#,
        )
        .bind(new.user_id)
        .bind(&new.session_token)
        .bind(&new.ip_address)
        .bind(&new.user_agent)
        .bind(new.expires_at)
        .fetch_one(&self.db)
        .await
        .context("insert session")?;
        Ok(session)
    }

    async fn delete(&self, session_token: &str) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM user_sessions WHERE session_token = $1")
            .bind(session_token)
            .execute(&self.db)
            .await
            .context("delete session")?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_for_user(&self, user_id: i64) -> anyhow::Result<Vec<Session>> {
        let rows = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, user_id, session_token, ip_address, user_agent, expires_at, created_at
              FROM user_sessions
             WHERE user_id = $1
             ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list sessions")?;
        Ok(rows)
    }
}
