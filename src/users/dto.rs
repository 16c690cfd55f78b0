use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::users::repo_types::{MembershipTier, ProfileChanges, Role, User, UserStatus};

/// Full profile as shown to its owner and to admins.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub membership_tier: MembershipTier,
    pub status: UserStatus,
    pub login_count: i32,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login: Option<OffsetDateTime>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub avatar_url: Option<String>,
    pub skills: Value,
    pub interests: Value,
    pub social_links: Value,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            membership_tier: user.membership_tier,
            status: user.status,
            login_count: user.login_count,
            last_login: user.last_login,
            bio: user.bio,
            location: user.location,
            website: user.website,
            avatar_url: user.avatar_url,
            skills: parse_json_text(user.skills.as_deref(), Value::Array(Vec::new())),
            interests: parse_json_text(user.interests.as_deref(), Value::Array(Vec::new())),
            social_links: parse_json_text(
                user.social_links.as_deref(),
                Value::Object(Default::default()),
            ),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Stored JSON text back to a value; absent or malformed text yields `empty`.
pub fn parse_json_text(text: Option<&str>, empty: Value) -> Value {
    text.and_then(|t| serde_json::from_str(t).ok())
        .unwrap_or(empty)
}

/// Request body for `PUT /me`; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub avatar_url: Option<String>,
    pub skills: Option<Value>,
    pub interests: Option<Value>,
    pub social_links: Option<Value>,
}

impl From<UpdateProfileRequest> for ProfileChanges {
    fn from(req: UpdateProfileRequest) -> Self {
        Self {
            // A blank name would leave the account without a display name.
            name: req.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            bio: req.bio,
            location: req.location,
            website: req.website,
            avatar_url: req.avatar_url,
            skills: req.skills.map(|v| v.to_string()),
            interests: req.interests.map(|v| v.to_string()),
            social_links: req.social_links.map(|v| v.to_string()),
        }
    }
}
