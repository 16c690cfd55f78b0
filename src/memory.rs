//! In-memory stores backing `AppState::fake()`, mirroring the Postgres
//! constraints the flows depend on (unique email, cascading deletes).

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::{
    activity::{
        repo::ActivityStore,
        repo_types::{ActivityEntry, ActivityFilter, NewActivity},
    },
    admin::{
        repo::AdminStore,
        repo_types::{ContentItem, DashboardStats, UserContent, UserFilter},
    },
    db::Page,
    sessions::{
        repo::SessionStore,
        repo_types::{NewSession, Session},
    },
    users::{
        repo::UserStore,
        repo_types::{AdminChanges, MembershipTier, NewUser, ProfileChanges, Role, User, UserStatus},
    },
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<User>,
    sessions: Vec<Session>,
    activity: Vec<ActivityEntry>,
    settings: BTreeMap<String, String>,
    projects: Vec<(i64, ContentItem)>,
    jobs: Vec<(i64, ContentItem)>,
    events: Vec<(i64, ContentItem)>,
    forum_posts: Vec<(i64, ContentItem)>,
}

impl Tables {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn user_mut(&mut self, id: i64) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == id)
    }

    fn content_mut(&mut self, kind: ContentKind) -> &mut Vec<(i64, ContentItem)> {
        match kind {
            ContentKind::Project => &mut self.projects,
            ContentKind::Job => &mut self.jobs,
            ContentKind::Event => &mut self.events,
            ContentKind::ForumPost => &mut self.forum_posts,
        }
    }
}

/// Content tables owned by a user, seeded directly by tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Project,
    Job,
    Event,
    ForumPost,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a content row owned by `owner`; returns its id.
    pub async fn seed_content(
        &self,
        kind: ContentKind,
        owner: i64,
        title: &str,
        created_at: OffsetDateTime,
    ) -> i64 {
        let mut t = self.tables.lock().await;
        let id = t.id();
        t.content_mut(kind).push((
            owner,
            ContentItem {
                id,
                title: title.to_string(),
                created_at,
            },
        ));
        id
    }
}

fn window<T>(rows: Vec<T>, limit: i64, offset: i64) -> Page<T> {
    let total = rows.len() as i64;
    let items = rows
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect();
    Page { items, total }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn owned_by(rows: &[(i64, ContentItem)], user_id: i64, limit: i64) -> Vec<ContentItem> {
    let mut items: Vec<_> = rows
        .iter()
        .filter(|(owner, _)| *owner == user_id)
        .map(|(_, item)| item.clone())
        .collect();
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    items.truncate(limit.max(0) as usize);
    items
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let t = self.tables.lock().await;
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        let t = self.tables.lock().await;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, new: NewUser) -> anyhow::Result<Option<i64>> {
        let mut t = self.tables.lock().await;
        if t.users.iter().any(|u| u.email == new.email) {
            return Ok(None);
        }
        let id = t.id();
        let now = OffsetDateTime::now_utc();
        t.users.push(User {
            id,
            email: new.email,
            name: new.name,
            password_hash: new.password_hash,
            role: Role::Member,
            membership_tier: MembershipTier::Free,
            status: UserStatus::Active,
            login_count: 0,
            last_login: None,
            bio: None,
            location: None,
            website: None,
            avatar_url: None,
            skills: None,
            interests: None,
            social_links: None,
            verification_token: Some(new.verification_token),
            reset_token: None,
            reset_token_expires: None,
            created_at: now,
            updated_at: now,
        });
        Ok(Some(id))
    }

    async fn record_login(&self, id: i64, at: OffsetDateTime) -> anyhow::Result<()> {
        let mut t = self.tables.lock().await;
        if let Some(user) = t.user_mut(id) {
            user.login_count += 1;
            user.last_login = Some(at);
        }
        Ok(())
    }

    async fn set_reset_token(
        &self,
        id: i64,
        token: &str,
        expires: OffsetDateTime,
    ) -> anyhow::Result<()> {
        let mut t = self.tables.lock().await;
        if let Some(user) = t.user_mut(id) {
            user.reset_token = Some(token.to_string());
            user.reset_token_expires = Some(expires);
        }
        Ok(())
    }

    async fn update_profile(&self, id: i64, changes: &ProfileChanges) -> anyhow::Result<bool> {
        let mut t = self.tables.lock().await;
        let Some(user) = t.user_mut(id) else {
            return Ok(false);
        };
        if let Some(v) = &changes.name {
            user.name = v.clone();
        }
        for (column, value) in [
            (&mut user.bio, &changes.bio),
            (&mut user.location, &changes.location),
            (&mut user.website, &changes.website),
            (&mut user.avatar_url, &changes.avatar_url),
            (&mut user.skills, &changes.skills),
            (&mut user.interests, &changes.interests),
            (&mut user.social_links, &changes.social_links),
        ] {
            if value.is_some() {
                *column = value.clone();
            }
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(true)
    }

    async fn update_account(&self, id: i64, changes: &AdminChanges) -> anyhow::Result<bool> {
        let mut t = self.tables.lock().await;
        let Some(user) = t.user_mut(id) else {
            return Ok(false);
        };
        if let Some(name) = &changes.name {
            user.name = name.clone();
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(status) = changes.status {
            user.status = status;
        }
        if let Some(tier) = changes.membership_tier {
            user.membership_tier = tier;
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(true)
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let mut t = self.tables.lock().await;
        let before = t.users.len();
        t.users.retain(|u| u.id != id);
        if t.users.len() == before {
            return Ok(false);
        }
        // ON DELETE CASCADE
        t.sessions.retain(|s| s.user_id != id);
        t.activity.retain(|a| a.user_id != Some(id));
        for kind in [
            ContentKind::Project,
            ContentKind::Job,
            ContentKind::Event,
            ContentKind::ForumPost,
        ] {
            t.content_mut(kind).retain(|(owner, _)| *owner != id);
        }
        Ok(true)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create(&self, new: NewSession) -> anyhow::Result<Session> {
        let mut t = self.tables.lock().await;
        let session = Session {
            id: t.id(),
            user_id: new.user_id,
            session_token: new.session_token,
            ip_address: new.ip_address,
            user_agent: new.user_agent,
            expires_at: new.expires_at,
            created_at: OffsetDateTime::now_utc(),
        };
        t.sessions.push(session.clone());
        Ok(session)
    }

    async fn delete(&self, session_token: &str) -> anyhow::Result<bool> {
        let mut t = self.tables.lock().await;
        let before = t.sessions.len();
        t.sessions.retain(|s| s.session_token != session_token);
        Ok(t.sessions.len() != before)
    }

    async fn list_for_user(&self, user_id: i64) -> anyhow::Result<Vec<Session>> {
        let t = self.tables.lock().await;
        let mut sessions: Vec<_> = t
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(sessions)
    }
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn append(&self, entry: &NewActivity) -> anyhow::Result<()> {
        let mut t = self.tables.lock().await;
        let row = ActivityEntry {
            id: t.id(),
            user_id: entry.user_id,
            action: entry.action.clone(),
            target_type: entry.target_type.clone(),
            target_id: entry.target_id,
            details: entry.details_text(),
            ip_address: entry.ip_address.clone(),
            created_at: OffsetDateTime::now_utc(),
        };
        t.activity.push(row);
        Ok(())
    }

    async fn query(&self, filter: &ActivityFilter) -> anyhow::Result<Page<ActivityEntry>> {
        let t = self.tables.lock().await;
        let mut rows: Vec<_> = t
            .activity
            .iter()
            .filter(|a| filter.user_id.map_or(true, |id| a.user_id == Some(id)))
            .filter(|a| {
                filter
                    .action
                    .as_deref()
                    .map_or(true, |needle| contains_ci(&a.action, needle))
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(window(rows, filter.limit, filter.offset))
    }
}

#[async_trait]
impl AdminStore for MemoryStore {
    async fn dashboard_stats(&self, since: OffsetDateTime) -> anyhow::Result<DashboardStats> {
        let t = self.tables.lock().await;
        let mut stats = DashboardStats {
            total_users: t.users.len() as i64,
            active_users: t.users.iter().filter(|u| u.status == UserStatus::Active).count() as i64,
            new_users_this_week: t.users.iter().filter(|u| u.created_at >= since).count() as i64,
            total_projects: t.projects.len() as i64,
            total_jobs: t.jobs.len() as i64,
            total_events: t.events.len() as i64,
            total_forum_posts: t.forum_posts.len() as i64,
            ..Default::default()
        };
        for user in &t.users {
            *stats.users_by_role.entry(user.role.to_string()).or_default() += 1;
            *stats
                .users_by_tier
                .entry(user.membership_tier.to_string())
                .or_default() += 1;
        }
        Ok(stats)
    }

    async fn list_users(&self, filter: &UserFilter) -> anyhow::Result<Page<User>> {
        let t = self.tables.lock().await;
        let mut rows: Vec<_> = t
            .users
            .iter()
            .filter(|u| {
                filter.search.as_deref().map_or(true, |needle| {
                    contains_ci(&u.email, needle) || contains_ci(&u.name, needle)
                })
            })
            .filter(|u| filter.role.map_or(true, |r| u.role == r))
            .filter(|u| filter.status.map_or(true, |s| u.status == s))
            .filter(|u| filter.membership_tier.map_or(true, |m| u.membership_tier == m))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(window(rows, filter.limit, filter.offset))
    }

    async fn user_content(&self, user_id: i64, limit: i64) -> anyhow::Result<UserContent> {
        let t = self.tables.lock().await;
        Ok(UserContent {
            projects: owned_by(&t.projects, user_id, limit),
            jobs: owned_by(&t.jobs, user_id, limit),
            forum_posts: owned_by(&t.forum_posts, user_id, limit),
        })
    }

    async fn settings(&self) -> anyhow::Result<BTreeMap<String, String>> {
        Ok(self.tables.lock().await.settings.clone())
    }

    async fn upsert_settings(&self, settings: &BTreeMap<String, String>) -> anyhow::Result<()> {
        let mut t = self.tables.lock().await;
        t.settings
            .extend(settings.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }
}
