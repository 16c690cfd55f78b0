use axum::{extract::State, routing::get, Json, Router};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::{
    activity::{actions, repo_types::NewActivity, services::record},
    auth::{
        dto::MessageResponse,
        extractors::{AuthUser, ClientMeta},
    },
    error::{ApiError, Payload},
    state::AppState,
    users::{
        dto::{UpdateProfileRequest, UserProfile},
        repo_types::ProfileChanges,
    },
};

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me).put(update_me))
}

#[instrument(skip(state, claims), fields(user_id = claims.sub))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<UserProfile>, ApiError> {
    let user = state.users.find_by_id(claims.sub).await?.ok_or_else(|| {
        warn!(user_id = claims.sub, "token for a user that no longer exists");
        ApiError::NotFound("User")
    })?;
    Ok(Json(UserProfile::from(user)))
}

#[instrument(skip(state, claims, payload), fields(user_id = claims.sub))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    meta: ClientMeta,
    Payload(payload): Payload<UpdateProfileRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let changes = ProfileChanges::from(payload);
    let fields = changes.changed_fields();

    if !fields.is_empty() {
        state.users.update_profile(claims.sub, &changes).await?;
    }

    record(
        state.activity.as_ref(),
        NewActivity::new(claims.sub, actions::PROFILE_UPDATED)
            .target("user", claims.sub)
            .details(json!({ "fields": fields }))
            .ip(meta.ip),
    )
    .await;

    info!(user_id = claims.sub, ?fields, "profile updated");
    Ok(Json(MessageResponse::new("Profile updated successfully")))
}
