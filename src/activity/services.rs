use tracing::{debug, warn};

use crate::activity::{repo::ActivityStore, repo_types::NewActivity};

/// Appends an audit entry after the primary write has committed.
///
/// Best-effort: a failed insert is logged and swallowed so the action being
/// described still succeeds.
pub async fn record(store: &dyn ActivityStore, entry: NewActivity) {
    match store.append(&entry).await {
        Ok(()) => debug!(action = %entry.action, user_id = ?entry.user_id, "activity recorded"),
        Err(e) => warn!(
            error = ?e,
            action = %entry.action,
            user_id = ?entry.user_id,
            "failed to record activity"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        activity::repo_types::{ActivityEntry, ActivityFilter},
        db::Page,
        memory::MemoryStore,
    };
    use async_trait::async_trait;
    use serde_json::json;

    struct BrokenStore;

    #[async_trait]
    impl ActivityStore for BrokenStore {
        async fn append(&self, _entry: &NewActivity) -> anyhow::Result<()> {
            anyhow::bail!("table is gone")
        }
        async fn query(&self, _filter: &ActivityFilter) -> anyhow::Result<Page<ActivityEntry>> {
            anyhow::bail!("table is gone")
        }
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        record(&BrokenStore, NewActivity::new(1, "user_login")).await;
    }

    #[tokio::test]
    async fn entries_come_back_newest_first_with_filters() {
        let store = MemoryStore::new();
        record(&store, NewActivity::new(1, "user_login")).await;
        record(
            &store,
            NewActivity::new(2, "admin_user_deleted")
                .target("user", 9)
                .details(json!({"email": "gone@x.com"})),
        )
        .await;
        record(&store, NewActivity::new(1, "user_logout")).await;

        let all = store
            .query(&ActivityFilter { limit: 50, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(all.total, 3);
        let actions: Vec<_> = all.items.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(actions, vec!["user_logout", "admin_user_deleted", "user_login"]);

        let mine = store
            .query(&ActivityFilter {
                user_id: Some(1),
                action: Some("LOG".into()),
                limit: 1,
                offset: 1,
            })
            .await
            .unwrap();
        assert_eq!(mine.total, 2);
        assert_eq!(mine.items.len(), 1);
        assert_eq!(mine.items[0].action, "user_login");

        let admin = store
            .query(&ActivityFilter {
                action: Some("admin_".into()),
                limit: 50,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(admin.items[0].target_id, Some(9));
        assert_eq!(admin.items[0].details.as_deref(), Some(r#"{"email":"gone@x.com"}"#));
    }

    #[tokio::test]
    async fn action_filter_treats_wildcards_literally() {
        let store = MemoryStore::new();
        record(&store, NewActivity::new(1, "adminXuser_deleted")).await;
        record(&store, NewActivity::new(1, "admin_user_deleted")).await;

        let hits = store
            .query(&ActivityFilter {
                action: Some("ADMIN_".into()),
                limit: 50,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(hits.total, 1);
        assert_eq!(hits.items[0].action, "admin_user_deleted");

        let none = store
            .query(&ActivityFilter {
                action: Some("%".into()),
                limit: 50,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(none.total, 0);
    }
}
