use rand::RngCore;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::sessions::{
    repo::SessionStore,
    repo_types::{NewSession, Session},
};

pub const SESSION_TTL: Duration = Duration::hours(24);

/// 32 random bytes, hex encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub async fn open_session(
    store: &dyn SessionStore,
    user_id: i64,
    ip_address: Option<String>,
    user_agent: Option<String>,
    now: OffsetDateTime,
) -> anyhow::Result<Session> {
    let session = store
        .create(NewSession {
            user_id,
            session_token: generate_token(),
            ip_address,
            user_agent,
            expires_at: now + SESSION_TTL,
        })
        .await?;
    debug!(user_id, session_id = session.id, "session opened");
    Ok(session)
}

/// Idempotent: closing an unknown token is not an error.
pub async fn close_session(store: &dyn SessionStore, session_token: &str) -> anyhow::Result<bool> {
    let deleted = store.delete(session_token).await?;
    debug!(deleted, "session close requested");
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[test]
    fn tokens_are_64_hex_chars_and_distinct() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn session_expires_a_day_after_opening() {
        let store = MemoryStore::new();
        let now = OffsetDateTime::now_utc();
        let session = open_session(&store, 7, Some("10.0.0.1".into()), None, now)
            .await
            .unwrap();
        assert_eq!(session.user_id, 7);
        assert_eq!(session.expires_at, now + Duration::hours(24));
        assert_eq!(session.ip_address.as_deref(), Some("10.0.0.1"));
    }

    #[tokio::test]
    async fn closing_removes_only_that_session_and_is_idempotent() {
        let store = MemoryStore::new();
        let now = OffsetDateTime::now_utc();
        let first = open_session(&store, 1, None, None, now).await.unwrap();
        let second = open_session(&store, 1, None, None, now).await.unwrap();

        assert!(close_session(&store, &first.session_token).await.unwrap());
        assert!(!close_session(&store, &first.session_token).await.unwrap());

        let left = store.list_for_user(1).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].session_token, second.session_token);
    }
}
