use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::users::repo_types::{AdminChanges, NewUser, ProfileChanges, User};

pub(crate) const USER_COLUMNS: &str = r#"
    id, email, name, password_hash, role, membership_tier, status, login_count, last_login,
    bio, location, website, avatar_url, skills, interests, social_links,
    verification_token, reset_token, reset_token_expires, created_at, updated_at
"#;

/// Credential store over the `users` table.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>>;
    /// Inserts the user and returns its id, or `None` when the email is taken.
    async fn create(&self, new: NewUser) -> anyhow::Result<Option<i64>>;
    async fn record_login(&self, id: i64, at: OffsetDateTime) -> anyhow::Result<()>;
    async fn set_reset_token(
        &self,
        id: i64,
        token: &str,
        expires: OffsetDateTime,
    ) -> anyhow::Result<()>;
    async fn update_profile(&self, id: i64, changes: &ProfileChanges) -> anyhow::Result<bool>;
    async fn update_account(&self, id: i64, changes: &AdminChanges) -> anyhow::Result<bool>;
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn create(&self, new: NewUser) -> anyhow::Result<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (email, name, password_hash, verification_token, status, role)
            VALUES ($1, $2, $3, $4, 'active', 'member')
            ON CONFLICT (email) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&new.email)
        .bind(&new.name)
        .bind(&new.password_hash)
        .bind(&new.verification_token)
        .fetch_optional(&self.db)
        .await
        .context("insert user")?;
        Ok(id)
    }

    async fn record_login(&self, id: i64, at: OffsetDateTime) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
               SET login_count = login_count + 1, last_login = $2
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(at)
        .execute(&self.db)
        .await
        .context("record login")?;
        Ok(())
    }

    async fn set_reset_token(
        &self,
        id: i64,
        token: &str,
        expires: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
               SET reset_token = $2, reset_token_expires = $3
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .bind(expires)
        .execute(&self.db)
        .await
        .context("store reset token")?;
        Ok(())
    }

    async fn update_profile(&self, id: i64, changes: &ProfileChanges) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET name         = COALESCE($2, name),
                   bio          = COALESCE($3, bio),
                   location     = COALESCE($4, location),
                   website      = COALESCE($5, website),
                   avatar_url   = COALESCE($6, avatar_url),
                   skills       = COALESCE($7, skills),
                   interests    = COALESCE($8, interests),
                   social_links = COALESCE($9, social_links),
                   updated_at   = now()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.bio)
        .bind(&changes.location)
        .bind(&changes.website)
        .bind(&changes.avatar_url)
        .bind(&changes.skills)
        .bind(&changes.interests)
        .bind(&changes.social_links)
        .execute(&self.db)
        .await
        .context("update profile")?;
        Ok(res.rows_affected() > 0)
    }

    async fn update_account(&self, id: i64, changes: &AdminChanges) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET name            = COALESCE($2, name),
                   role            = COALESCE($3, role),
                   status          = COALESCE($4, status),
                   membership_tier = COALESCE($5, membership_tier),
                   updated_at      = now()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(changes.role)
        .bind(changes.status)
        .bind(changes.membership_tier)
        .execute(&self.db)
        .await
        .context("update account")?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete user")?;
        Ok(res.rows_affected() > 0)
    }
}
