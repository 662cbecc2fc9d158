// SPDX-License-Identifier: MIT

//! Session endpoints: register, login, profile, refresh, logout.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthSession;
use crate::models::{NewUser, UserProfile};
use crate::services::session;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// Routes reachable without a token.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/user/register", post(register))
        .route("/user/login", post(login))
}

/// Routes behind the auth middleware (applied in routes/mod.rs).
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/user/profile", get(profile))
        .route("/user/refresh", post(refresh))
        .route("/user/logout", post(logout))
        .route("/user/logout/all", post(logout_all))
}

// ─── Request/response bodies ─────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Email 格式不正確"))]
    pub email: String,
    #[validate(length(min = 6, message = "密碼長度至少 6 個字元"))]
    pub password: String,
    #[validate(length(min = 1, message = "顯示名稱為必填欄位"))]
    pub display_name: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub data: UserProfile,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    pub data: UserProfile,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub data: UserProfile,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
}

/// Map body-extraction failures to the uniform envelope.
fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(_) => Err(AppError::BadRequest("JSON 格式錯誤".to_string())),
    }
}

fn validated(req: &impl Validate) -> Result<()> {
    req.validate()
        .map_err(|e| AppError::Validation(first_validation_message(&e)))
}

fn first_validation_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|field| field.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "格式不正確".to_string())
}

// ─── Handlers ────────────────────────────────────────────────

/// Create a password account. No token is issued here; the client logs in
/// next.
async fn register(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>> {
    let req = json_body(payload)?;
    validated(&req)?;

    let user = state
        .store
        .create(NewUser {
            email: req.email,
            password: Some(req.password),
            google_id: None,
            display_name: req.display_name,
            avatar: String::new(),
        })
        .await?;

    tracing::info!(user_id = %user.id, "Registered new user");

    Ok(Json(RegisterResponse {
        success: true,
        message: "註冊成功".to_string(),
        data: user.profile(),
    }))
}

/// Password login. On success the new token has joined the user's token
/// set and is returned to the client.
async fn login(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    let req = json_body(payload)?;

    let (user, token) =
        session::password_login(&state.store, &state.tokens, &req.email, &req.password).await?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        success: true,
        message: "登入成功".to_string(),
        token,
        data: user.profile(),
    }))
}

/// Current user's profile, as the sanitized projection.
async fn profile(Extension(auth): Extension<AuthSession>) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        success: true,
        data: auth.user.profile(),
    })
}

/// Swap the presented token (possibly expired; this path is exempt) for a
/// fresh one.
async fn refresh(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthSession>,
) -> Result<Json<RefreshResponse>> {
    let AuthSession { mut user, token } = auth;

    let new_token = session::refresh(&state.store, &state.tokens, &mut user, &token).await?;

    tracing::info!(user_id = %user.id, "Session token refreshed");

    Ok(Json(RefreshResponse {
        success: true,
        message: "Token 更新成功".to_string(),
        token: new_token,
    }))
}

/// Sign out this device only.
async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthSession>,
) -> Result<Json<MessageResponse>> {
    let AuthSession { mut user, token } = auth;

    session::logout(&state.store, &mut user, &token).await?;

    tracing::info!(user_id = %user.id, "User logged out");

    Ok(Json(MessageResponse {
        success: true,
        message: "登出成功".to_string(),
    }))
}

/// Sign out every device at once.
async fn logout_all(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthSession>,
) -> Result<Json<MessageResponse>> {
    let AuthSession { mut user, .. } = auth;

    session::logout_all(&state.store, &mut user).await?;

    tracing::info!(user_id = %user.id, "User logged out of all devices");

    Ok(Json(MessageResponse {
        success: true,
        message: "已登出所有裝置".to_string(),
    }))
}
