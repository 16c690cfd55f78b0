use serde::{Serialize, Serializer};
use serde_json::Value;
use sqlx::FromRow;
use time::OffsetDateTime;

/// Append-only audit row from `user_activity_log`.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: i64,
    pub user_id: Option<i64>,
    pub action: String,
    pub target_type: Option<String>,
    pub target_id: Option<i64>,
    #[serde(serialize_with = "details_as_json")]
    pub details: Option<String>,
    pub ip_address: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

// Stored as text; handed back as the JSON it encodes, or as the raw string if it no longer parses.
fn details_as_json<S: Serializer>(details: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
    match details {
        None => s.serialize_none(),
        Some(text) => match serde_json::from_str::<Value>(text) {
            Ok(v) => v.serialize(s),
            Err(_) => s.serialize_str(text),
        },
    }
}

/// Entry about to be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub user_id: Option<i64>,
    pub action: String,
    pub target_type: Option<String>,
    pub target_id: Option<i64>,
    pub details: Option<Value>,
    pub ip_address: Option<String>,
}

impl NewActivity {
    pub fn new(user_id: i64, action: &str) -> Self {
        Self {
            user_id: Some(user_id),
            action: action.to_string(),
            target_type: None,
            target_id: None,
            details: None,
            ip_address: None,
        }
    }

    pub fn target(mut self, target_type: &str, target_id: i64) -> Self {
        self.target_type = Some(target_type.to_string());
        self.target_id = Some(target_id);
        self
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn ip(mut self, ip_address: Option<String>) -> Self {
        self.ip_address = ip_address;
        self
    }

    pub fn details_text(&self) -> Option<String> {
        self.details.as_ref().map(Value::to_string)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub user_id: Option<i64>,
    /// Case-insensitive substring of the action label.
    pub action: Option<String>,
    pub limit: i64,
    pub offset: i64,
}
