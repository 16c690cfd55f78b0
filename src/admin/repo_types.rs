use std::collections::BTreeMap;

use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::users::repo_types::{MembershipTier, Role, UserStatus};

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    pub active_users: i64,
    pub new_users_this_week: i64,
    pub users_by_role: BTreeMap<String, i64>,
    pub users_by_tier: BTreeMap<String, i64>,
    pub total_projects: i64,
    pub total_jobs: i64,
    pub total_events: i64,
    pub total_forum_posts: i64,
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Case-insensitive substring of email or name.
    pub search: Option<String>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    pub membership_tier: Option<MembershipTier>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: i64,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// What a user has published, as listed in the admin user view.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContent {
    pub projects: Vec<ContentItem>,
    pub jobs: Vec<ContentItem>,
    pub forum_posts: Vec<ContentItem>,
}
