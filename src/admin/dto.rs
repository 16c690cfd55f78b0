use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    activity::repo_types::ActivityEntry,
    admin::repo_types::{DashboardStats, UserContent},
    sessions::repo_types::Session,
    users::{
        dto::UserProfile,
        repo_types::{AdminChanges, MembershipTier, Role, UserStatus},
    },
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub stats: DashboardStats,
    pub recent_activity: Vec<ActivityEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    pub search: Option<String>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    pub membership_tier: Option<MembershipTier>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        Self {
            page,
            limit,
            total,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserProfile>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct UserDetailResponse {
    pub user: UserProfile,
    pub activity: Vec<ActivityEntry>,
    pub sessions: Vec<Session>,
    pub content: UserContent,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateUserRequest {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    pub membership_tier: Option<MembershipTier>,
}

impl From<AdminUpdateUserRequest> for AdminChanges {
    fn from(req: AdminUpdateUserRequest) -> Self {
        Self {
            name: req.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            role: req.role,
            status: req.status,
            membership_tier: req.membership_tier,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQuery {
    pub user_id: Option<i64>,
    pub action: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub logs: Vec<ActivityEntry>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Settings arrive as arbitrary JSON values and are stored as text.
pub fn settings_from_json(raw: BTreeMap<String, Value>) -> BTreeMap<String, String> {
    raw.into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (key, text)
        })
        .collect()
}
