use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    activity::repo_types::{ActivityEntry, ActivityFilter, NewActivity},
    db::Page,
};

#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn append(&self, entry: &NewActivity) -> anyhow::Result<()>;
    /// Newest first.
    async fn query(&self, filter: &ActivityFilter) -> anyhow::Result<Page<ActivityEntry>>;
}

#[derive(Clone)]
pub struct PgActivityStore {
    db: PgPool,
}

impl PgActivityStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ActivityStore for PgActivityStore {
    async fn append(&self, entry: &NewActivity) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_activity_log
                (user_id, action, target_type, target_id, details, ip_address)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.user_id)
        .bind(&entry.action)
        .bind(&entry.target_type)
        .bind(entry.target_id)
        .bind(entry.details_text())
        .bind(&entry.ip_address)
        .execute(&self.db)
        .await
        .context("append activity")?;
        Ok(())
    }

    async fn query(&self, filter: &ActivityFilter) -> anyhow::Result<Page<ActivityEntry>> {
        let items = sqlx::query_as::<_, ActivityEntry>(
            r#"
            SELECT id, user_id, action, target_type, target_id, details, ip_address, created_at
              FROM user_activity_log
             WHERE ($1::BIGINT IS NULL OR user_id = $1)
               AND ($2::TEXT IS NULL OR strpos(lower(action), lower($2)) > 0)
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.user_id)
        .bind(&filter.action)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.db)
        .await
        .context("query activity")?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
              FROM user_activity_log
             WHERE ($1::BIGINT IS NULL OR user_id = $1)
               AND ($2::TEXT IS NULL OR strpos(lower(action), lower($2)) > 0)
            "#,
        )
        .bind(filter.user_id)
        .bind(&filter.action)
        .fetch_one(&self.db)
        .await
        .context("count activity")?;

        Ok(Page { items, total })
    }
}
