use std::collections::BTreeMap;

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use time::{Duration, OffsetDateTime};
use tracing::{info, instrument, warn};

use crate::{
    activity::{
        actions,
        repo_types::{ActivityFilter, NewActivity},
        services::record,
    },
    admin::{
        dto::{
            settings_from_json, ActivityQuery, ActivityResponse, AdminUpdateUserRequest,
            DashboardResponse, Pagination, UserDetailResponse, UserListQuery, UserListResponse,
        },
        repo_types::UserFilter,
    },
    auth::{
        dto::MessageResponse,
        extractors::{AdminUser, ClientMeta},
    },
    db::Window,
    error::{ApiError, PathParam, Payload, QueryParams},
    state::AppState,
    users::{dto::UserProfile, repo_types::AdminChanges},
};

const RECENT_ACTIVITY: i64 = 10;
const USER_ACTIVITY: i64 = 50;
const USER_CONTENT: i64 = 20;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/dashboard", get(dashboard))
        .route("/admin/users", get(list_users))
        .route(
            "/admin/users/:id",
            get(user_detail).put(update_user).delete(delete_user),
        )
        .route("/admin/settings", get(get_settings).put(update_settings))
        .route("/admin/activity", get(activity_log))
}

#[instrument(skip(state, _admin))]
pub async fn dashboard(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<DashboardResponse>, ApiError> {
    let since = OffsetDateTime::now_utc() - Duration::days(7);
    let stats = state.admin.dashboard_stats(since).await?;
    let recent = state
        .activity
        .query(&ActivityFilter {
            limit: RECENT_ACTIVITY,
            ..Default::default()
        })
        .await?;
    Ok(Json(DashboardResponse {
        stats,
        recent_activity: recent.items,
    }))
}

#[instrument(skip(state, _admin))]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    QueryParams(q): QueryParams<UserListQuery>,
) -> Result<Json<UserListResponse>, ApiError> {
    let window = Window::page(q.page, q.limit, 20, 100);
    let page = state
        .admin
        .list_users(&UserFilter {
            search: q.search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            role: q.role,
            status: q.status,
            membership_tier: q.membership_tier,
            limit: window.limit,
            offset: window.offset,
        })
        .await?;

    Ok(Json(UserListResponse {
        users: page.items.into_iter().map(UserProfile::from).collect(),
        pagination: Pagination::new(
            window.offset / window.limit + 1,
            window.limit,
            page.total,
        ),
    }))
}

#[instrument(skip(state, _admin))]
pub async fn user_detail(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    PathParam(id): PathParam<i64>,
) -> Result<Json<UserDetailResponse>, ApiError> {
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    let activity = state
        .activity
        .query(&ActivityFilter {
            user_id: Some(id),
            limit: USER_ACTIVITY,
            ..Default::default()
        })
        .await?;
    let sessions = state.sessions.list_for_user(id).await?;
    let content = state.admin.user_content(id, USER_CONTENT).await?;

    Ok(Json(UserDetailResponse {
        user: UserProfile::from(user),
        activity: activity.items,
        sessions,
        content,
    }))
}

#[instrument(skip(state, admin, payload), fields(admin_id = admin.sub))]
pub async fn update_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    meta: ClientMeta,
    PathParam(id): PathParam<i64>,
    Payload(payload): Payload<AdminUpdateUserRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let changes = AdminChanges::from(payload);
    if !state.users.update_account(id, &changes).await? {
        return Err(ApiError::NotFound("User"));
    }

    let details = serde_json::to_value(&changes).map_err(anyhow::Error::from)?;
    record(
        state.activity.as_ref(),
        NewActivity::new(admin.sub, actions::ADMIN_USER_UPDATED)
            .target("user", id)
            .details(details)
            .ip(meta.ip),
    )
    .await;

    info!(admin_id = admin.sub, user_id = id, "user updated by admin");
    Ok(Json(MessageResponse::new("User updated successfully")))
}

#[instrument(skip(state, admin), fields(admin_id = admin.sub))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    meta: ClientMeta,
    PathParam(id): PathParam<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    if id == admin.sub {
        warn!(admin_id = admin.sub, "admin tried to delete own account");
        return Err(ApiError::BadRequest("Cannot delete your own account".into()));
    }

    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    if !state.users.delete(id).await? {
        return Err(ApiError::NotFound("User"));
    }

    record(
        state.activity.as_ref(),
        NewActivity::new(admin.sub, actions::ADMIN_USER_DELETED)
            .target("user", id)
            .details(json!({ "email": user.email }))
            .ip(meta.ip),
    )
    .await;

    info!(admin_id = admin.sub, user_id = id, "user deleted by admin");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

#[instrument(skip(state, _admin))]
pub async fn get_settings(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<BTreeMap<String, String>>, ApiError> {
    Ok(Json(state.admin.settings().await?))
}

#[instrument(skip(state, admin, payload), fields(admin_id = admin.sub))]
pub async fn update_settings(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    meta: ClientMeta,
    Payload(payload): Payload<BTreeMap<String, Value>>,
) -> Result<Json<MessageResponse>, ApiError> {
    let settings = settings_from_json(payload);
    state.admin.upsert_settings(&settings).await?;

    let keys: Vec<&String> = settings.keys().collect();
    record(
        state.activity.as_ref(),
        NewActivity::new(admin.sub, actions::ADMIN_SETTINGS_UPDATED)
            .details(json!({ "keys": keys }))
            .ip(meta.ip),
    )
    .await;

    info!(admin_id = admin.sub, count = settings.len(), "settings updated");
    Ok(Json(MessageResponse::new("Settings updated successfully")))
}

#[instrument(skip(state, _admin))]
pub async fn activity_log(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    QueryParams(q): QueryParams<ActivityQuery>,
) -> Result<Json<ActivityResponse>, ApiError> {
    let window = Window::clamped(q.limit, q.offset, 50, 200);
    let page = state
        .activity
        .query(&ActivityFilter {
            user_id: q.user_id,
            action: q.action.filter(|a| !a.trim().is_empty()),
            limit: window.limit,
            offset: window.offset,
        })
        .await?;
    Ok(Json(ActivityResponse {
        logs: page.items,
        total: page.total,
        limit: window.limit,
        offset: window.offset,
    }))
}
