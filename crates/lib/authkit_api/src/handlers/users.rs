//! User request handlers.

use axum::extract::State;
use axum::{Extension, Json};

use authkit_core::models::auth::DEFAULT_ROLE;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::UserResponse;

/// `GET /v1/users/me` — current user's profile. Requires the `user` role.
pub async fn me_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<UserResponse>> {
    if !user.0.roles.iter().any(|role| role == DEFAULT_ROLE) {
        return Err(AppError::Forbidden("Missing required role".into()));
    }

    let profile = state
        .users
        .find_by_id(&user.0.sub)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("user not found".into()))?;

    Ok(Json(profile.into()))
}
