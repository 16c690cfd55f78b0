use std::collections::BTreeMap;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::{
    admin::repo_types::{ContentItem, DashboardStats, UserContent, UserFilter},
    db::Page,
    users::{repo::USER_COLUMNS, repo_types::User},
};

/// Read models and settings behind the admin console.
#[async_trait]
pub trait AdminStore: Send + Sync {
    /// `since` bounds the "new users" count.
    async fn dashboard_stats(&self, since: OffsetDateTime) -> anyhow::Result<DashboardStats>;
    async fn list_users(&self, filter: &UserFilter) -> anyhow::Result<Page<User>>;
    async fn user_content(&self, user_id: i64, limit: i64) -> anyhow::Result<UserContent>;
    async fn settings(&self) -> anyhow::Result<BTreeMap<String, String>>;
    async fn upsert_settings(&self, settings: &BTreeMap<String, String>) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgAdminStore {
    db: PgPool,
}

impl PgAdminStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn count_by(&self, column: &str) -> anyhow::Result<BTreeMap<String, i64>> {
        let rows = sqlx::query_as::<_, (String, i64)>(&format!(
            "SELECT {column}::TEXT, COUNT(*) FROM users GROUP BY {column}"
        ))
        .fetch_all(&self.db)
        .await
        .with_context(|| format!("count users by {column}"))?;
        Ok(rows.into_iter().collect())
    }

    async fn content(&self, sql: &str, user_id: i64, limit: i64) -> anyhow::Result<Vec<ContentItem>> {
        let rows = sqlx::query_as::<_, ContentItem>(sql)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl AdminStore for PgAdminStore {
    async fn dashboard_stats(&self, since: OffsetDateTime) -> anyhow::Result<DashboardStats> {
        let (total_users, active_users, new_users_this_week) =
            sqlx::query_as::<_, (i64, i64, i64)>(
                r#"
                SELECT COUNT(*),
                       COUNT(*) FILTER (WHERE status = 'active'),
                       COUNT(*) FILTER (WHERE created_at >= $1)
                  FROM users
                "#,
            )
            .bind(since)
            .fetch_one(&self.db)
            .await
            .context("count users")?;

        let (total_projects, total_jobs, total_events, total_forum_posts) =
            sqlx::query_as::<_, (i64, i64, i64, i64)>(
                r#"
                SELECT (SELECT COUNT(*) FROM projects),
                       (SELECT COUNT(*) FROM jobs),
                       (SELECT COUNT(*) FROM events),
                       (SELECT COUNT(*) FROM forum_posts)
                "#,
            )
            .fetch_one(&self.db)
            .await
            .context("count content")?;

        Ok(DashboardStats {
            total_users,
            active_users,
            new_users_this_week,
            users_by_role: self.count_by("role").await?,
            users_by_tier: self.count_by("membership_tier").await?,
            total_projects,
            total_jobs,
            total_events,
            total_forum_posts,
        })
    }

    async fn list_users(&self, filter: &UserFilter) -> anyhow::Result<Page<User>> {
        const WHERE: &str = r#"
            WHERE ($1::TEXT IS NULL
                   OR strpos(lower(email), lower($1)) > 0
                   OR strpos(lower(name), lower($1)) > 0)
              AND ($2::user_role IS NULL OR role = $2)
              AND ($3::user_status IS NULL OR status = $3)
              AND ($4::membership_tier IS NULL OR membership_tier = $4)
        "#;

        let items = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users {WHERE} ORDER BY created_at DESC, id DESC LIMIT $5 OFFSET $6"
        ))
        .bind(&filter.search)
        .bind(filter.role)
        .bind(filter.status)
        .bind(filter.membership_tier)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.db)
        .await
        .context("list users")?;

        let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM users {WHERE}"))
            .bind(&filter.search)
            .bind(filter.role)
            .bind(filter.status)
            .bind(filter.membership_tier)
            .fetch_one(&self.db)
            .await
            .context("count listed users")?;

        Ok(Page { items, total })
    }

    async fn user_content(&self, user_id: i64, limit: i64) -> anyhow::Result<UserContent> {
        let projects = self
            .content(
                "SELECT id, title, created_at FROM projects WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
                user_id,
                limit,
            )
            .await
            .context("list user projects")?;
        let jobs = self
            .content(
                "SELECT id, title, created_at FROM jobs WHERE posted_by = $1 ORDER BY created_at DESC LIMIT $2",
                user_id,
                limit,
            )
            .await
            .context("list user jobs")?;
        let forum_posts = self
            .content(
                "SELECT id, title, created_at FROM forum_posts WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
                user_id,
                limit,
            )
            .await
            .context("list user forum posts")?;

        Ok(UserContent {
            projects,
            jobs,
            forum_posts,
        })
    }

    async fn settings(&self) -> anyhow::Result<BTreeMap<String, String>> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT setting_key, setting_value FROM platform_settings",
        )
        .fetch_all(&self.db)
        .await
        .context("load settings")?;
        Ok(rows.into_iter().collect())
    }

    async fn upsert_settings(&self, settings: &BTreeMap<String, String>) -> anyhow::Result<()> {
        for (key, value) in settings {
            sqlx::query(
                r#"
                INSERT INTO platform_settings (setting_key, setting_value)
                VALUES ($1, $2)
                ON CONFLICT (setting_key)
                DO UPDATE SET setting_value = EXCLUDED.setting_value, updated_at = now()
                "#,
            )
            .bind(key)
            .bind(value)
            .execute(&self.db)
            .await
            .with_context(|| format!("upsert setting {key}"))?;
        }
        Ok(())
    }
}
