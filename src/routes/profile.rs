use axum::Json;
use axum::extract::State;

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::routes::auth::UserResponse;
use crate::state::SharedState;

pub async fn get_profile(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.auth.get_profile(auth.user_id).await?;
    Ok(Json(UserResponse { user }))
}
