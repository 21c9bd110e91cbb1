pub mod auth;
pub mod profile;

use axum::Router;
use axum::extract::FromRequest;
use axum::routing::{get, post};

use crate::error::AppError;
use crate::state::SharedState;

/// `axum::Json` whose rejections (bad syntax, wrong types, missing
/// content type) surface as [`AppError`] responses.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/forgot-password", post(auth::forgot_password))
        .route("/api/auth/reset-password", post(auth::reset_password))
        .route(
            "/api/auth/reset-password/verify",
            post(auth::check_reset_token),
        )
        // Profile
        .route("/api/profile", get(profile::get_profile))
}
