use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};

use crate::{
    activity::{actions, repo_types::NewActivity, services::record},
    auth::{
        claims::Claims,
        dto::{
            LoginRequest, LoginResponse, MessageResponse, PasswordResetRequest, PublicUser,
            RegisterRequest, RegisterResponse,
        },
        extractors::ClientMeta,
        jwt::JwtKeys,
        password::{hash_password_async, verify_password_async},
    },
    error::ApiError,
    sessions::services::{close_session, generate_token, open_session},
    state::AppState,
    users::repo_types::{NewUser, UserStatus},
};

pub const RESET_TOKEN_TTL: Duration = Duration::hours(1);
pub const RESET_REQUESTED_MESSAGE: &str =
    "If an account exists for that email, password reset instructions have been sent";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trimmed value of a required field; blank counts as missing.
fn required(field: Option<String>) -> Result<String, ApiError> {
    field
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::MissingFields)
}

/// Creates an active member account. No token is issued; the caller logs in separately.
pub async fn register(
    state: &AppState,
    req: RegisterRequest,
    meta: &ClientMeta,
) -> Result<RegisterResponse, ApiError> {
    let email = required(req.email)?;
    let name = required(req.name)?;
    // Passwords are taken as typed, only emptiness is rejected.
    let password = req
        .password
        .filter(|p| !p.is_empty())
        .ok_or(ApiError::MissingFields)?;

    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(ApiError::BadRequest("Invalid email".into()));
    }

    if state.users.find_by_email(&email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(ApiError::DuplicateUser);
    }

    let password_hash = hash_password_async(password, state.config.password_hash_cost).await?;

    // Stored for a confirmation step that does not exist yet.
    let verification_token = generate_token();

    let user_id = state
        .users
        .create(NewUser {
            email: email.clone(),
            name,
            password_hash,
            verification_token,
        })
        .await?
        .ok_or_else(|| {
            warn!(%email, "email registered concurrently");
            ApiError::DuplicateUser
        })?;

    record(
        state.activity.as_ref(),
        NewActivity::new(user_id, actions::USER_REGISTERED)
            .target("user", user_id)
            .ip(meta.ip.clone()),
    )
    .await;

    info!(user_id, %email, "user registered");
    Ok(RegisterResponse {
        message: "User registered successfully".into(),
        user_id,
        verification_required: false,
    })
}

/// Checks credentials, then issues a bearer token and opens a session record.
///
/// Unknown email and wrong password produce the same `InvalidCredentials`.
pub async fn login(
    state: &AppState,
    req: LoginRequest,
    meta: &ClientMeta,
) -> Result<LoginResponse, ApiError> {
    let email = required(req.email)?;
    let password = req
        .password
        .filter(|p| !p.is_empty())
        .ok_or(ApiError::MissingFields)?;

    let user = match state.users.find_by_email(&email).await? {
        Some(u) => u,
        None => {
            warn!(%email, "login unknown email");
            return Err(ApiError::InvalidCredentials);
        }
    };

    if user.status != UserStatus::Active {
        warn!(user_id = user.id, status = ?user.status, "login on inactive account");
        return Err(ApiError::AccountNotActive);
    }

    if !verify_password_async(password, user.password_hash.clone()).await? {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = JwtKeys::new(&state.config.jwt).issue((&user).into())?;

    let now = OffsetDateTime::now_utc();
    state.users.record_login(user.id, now).await?;
    let session = open_session(
        state.sessions.as_ref(),
        user.id,
        meta.ip.clone(),
        meta.user_agent.clone(),
        now,
    )
    .await?;

    record(
        state.activity.as_ref(),
        NewActivity::new(user.id, actions::USER_LOGIN).ip(meta.ip.clone()),
    )
    .await;

    info!(user_id = user.id, "user logged in");
    Ok(LoginResponse {
        message: "Login successful".into(),
        token,
        session_token: session.session_token,
        user: PublicUser::from(&user),
    })
}

/// Drops the named session row if one is given. The bearer token stays valid until it expires.
pub async fn logout(
    state: &AppState,
    claims: &Claims,
    session_token: Option<String>,
    meta: &ClientMeta,
) -> Result<MessageResponse, ApiError> {
    let session_deleted = match session_token.as_deref() {
        Some(token) => close_session(state.sessions.as_ref(), token).await?,
        None => false,
    };

    record(
        state.activity.as_ref(),
        NewActivity::new(claims.sub, actions::USER_LOGOUT)
            .details(json!({ "sessionDeleted": session_deleted }))
            .ip(meta.ip.clone()),
    )
    .await;

    info!(user_id = claims.sub, session_deleted, "user logged out");
    Ok(MessageResponse::new("Logged out successfully"))
}

/// Answers identically whether or not the email belongs to an account.
pub async fn request_password_reset(
    state: &AppState,
    req: PasswordResetRequest,
    meta: &ClientMeta,
) -> Result<MessageResponse, ApiError> {
    let email = required(req.email)?;

    if let Some(user) = state.users.find_by_email(&email).await? {
        let token = generate_token();
        let expires = OffsetDateTime::now_utc() + RESET_TOKEN_TTL;
        // A failure here must not answer differently from an unknown email.
        if let Err(e) = state.users.set_reset_token(user.id, &token, expires).await {
            warn!(error = ?e, user_id = user.id, "storing reset token failed");
            return Ok(MessageResponse::new(RESET_REQUESTED_MESSAGE));
        }
        if let Err(e) = state.mailer.send_reset(&user.email, &token, expires).await {
            warn!(error = ?e, user_id = user.id, "reset mail delivery failed");
        }
        record(
            state.activity.as_ref(),
            NewActivity::new(user.id, actions::PASSWORD_RESET_REQUESTED).ip(meta.ip.clone()),
        )
        .await;
        info!(user_id = user.id, "password reset requested");
    } else {
        info!(%email, "password reset requested for unknown email");
    }

    Ok(MessageResponse::new(RESET_REQUESTED_MESSAGE))
}
