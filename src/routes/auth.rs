use std::sync::LazyLock;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::PublicUser;
use crate::routes::JsonBody;
use crate::state::SharedState;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").unwrap());

/// Sent for every forgot-password request, whether or not the email is known.
const RESET_REQUESTED_MESSAGE: &str =
    "If your email is registered, you will receive reset instructions shortly";

// Missing fields deserialize as empty strings so they fail validation with a
// 400 instead of being rejected by the JSON extractor.

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct CheckResetTokenRequest {
    #[serde(default)]
    pub token: String,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub user: PublicUser,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Serialize)]
pub struct ResetTokenStatus {
    pub valid: bool,
    pub email: String,
}

pub async fn register(
    State(state): State<SharedState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    if !EMAIL_RE.is_match(&req.email) {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }

    let user = state
        .auth
        .register(&req.email, &req.password, &req.first_name, &req.last_name)
        .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

pub async fn login(
    State(state): State<SharedState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let outcome = state.auth.login(&req.email, &req.password).await?;

    tracing::info!(user_id = %outcome.user.id, "User logged in");

    Ok(Json(AuthResponse {
        token: outcome.token,
        user: outcome.user,
    }))
}

pub async fn forgot_password(
    State(state): State<SharedState>,
    JsonBody(req): JsonBody<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if req.email.is_empty() {
        return Err(AppError::BadRequest("Email is required".to_string()));
    }

    let token = state.auth.request_password_reset(&req.email).await?;

    // Relaying the token here stands in for out-of-band delivery and leaks
    // account existence; production deployments should turn exposure off.
    let token = token.filter(|_| state.config.expose_reset_token);

    Ok(Json(MessageResponse {
        message: RESET_REQUESTED_MESSAGE.to_string(),
        token,
    }))
}

/// Reports whether a reset token is still redeemable without spending it.
/// The token travels in the body so it stays out of URLs and request logs.
pub async fn check_reset_token(
    State(state): State<SharedState>,
    JsonBody(req): JsonBody<CheckResetTokenRequest>,
) -> Result<Json<ResetTokenStatus>, AppError> {
    if req.token.is_empty() {
        return Err(AppError::BadRequest("Token is required".to_string()));
    }

    let owner = state.auth.inspect_reset_token(&req.token).await?;

    Ok(Json(ResetTokenStatus {
        valid: true,
        email: owner.email,
    }))
}

pub async fn reset_password(
    State(state): State<SharedState>,
    JsonBody(req): JsonBody<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if req.token.is_empty() || req.new_password.is_empty() {
        return Err(AppError::BadRequest(
            "Token and new password are required".to_string(),
        ));
    }

    let user_id = state
        .auth
        .confirm_password_reset(&req.token, &req.new_password)
        .await?;

    tracing::info!(%user_id, "Password reset completed");

    Ok(Json(MessageResponse {
        message: "Password reset successfully".to_string(),
        token: None,
    }))
}
