use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            LoginRequest, LoginResponse, MessageResponse, PasswordResetRequest, RegisterRequest,
            RegisterResponse,
        },
        extractors::{AuthUser, ClientMeta, SessionToken},
        services,
    },
    error::{ApiError, Payload},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/request-password-reset", post(request_password_reset))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    meta: ClientMeta,
    Payload(payload): Payload<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let resp = services::register(&state, payload, &meta).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    meta: ClientMeta,
    Payload(payload): Payload<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    services::login(&state, payload, &meta).await.map(Json)
}

#[instrument(skip(state, claims, session_token), fields(user_id = claims.sub))]
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    SessionToken(session_token): SessionToken,
    meta: ClientMeta,
) -> Result<Json<MessageResponse>, ApiError> {
    services::logout(&state, &claims, session_token, &meta)
        .await
        .map(Json)
}

#[instrument(skip(state, payload))]
pub async fn request_password_reset(
    State(state): State<AppState>,
    meta: ClientMeta,
    Payload(payload): Payload<PasswordResetRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    services::request_password_reset(&state, payload, &meta)
        .await
        .map(Json)
}
