//! Authentication request handlers.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::RefreshSession;
use crate::models::{
    ForgotPasswordRequest, ResetPasswordRequest, SigninRequest, SignupRequest, TokenResponse,
    VerifyEmailParams,
};
use crate::validate;

/// `POST /auth/signup` — create an account and open its first session.
pub async fn signup_handler(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<TokenResponse>)> {
    validate::validate_email(&body.email)?;
    validate::validate_new_password(&body.password)?;

    let pair = state.auth.signup(&body.email, &body.password).await?;
    Ok((StatusCode::CREATED, Json(pair.into())))
}

/// `POST /auth/signin` — authenticate with email + password.
pub async fn signin_handler(
    State(state): State<AppState>,
    Json(body): Json<SigninRequest>,
) -> AppResult<Json<TokenResponse>> {
    validate::validate_email(&body.email)?;

    let pair = state.auth.signin(&body.email, &body.password).await?;
    Ok(Json(pair.into()))
}

/// `POST /auth/refresh` — exchange the bearer refresh token for a new
/// pair. The presented token is dead afterwards.
pub async fn refresh_handler(
    State(state): State<AppState>,
    Extension(session): Extension<RefreshSession>,
) -> AppResult<Json<TokenResponse>> {
    let pair = state
        .auth
        .refresh(&session.claims.email, &session.token)
        .await?;
    Ok(Json(pair.into()))
}

/// `POST /auth/logout` — close the active session.
pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(session): Extension<RefreshSession>,
) -> AppResult<StatusCode> {
    state
        .auth
        .logout(&session.claims.email, &session.token)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /auth/verify/email` — landing route of the emailed verification
/// link. Always 200 with a fixed message.
pub async fn verify_email_handler(
    State(state): State<AppState>,
    Query(params): Query<VerifyEmailParams>,
) -> &'static str {
    state.auth.verify_email(&params.email, &params.hash).await
}

/// `POST /auth/password/forgot` — email a reset token to the user.
pub async fn forgot_password_handler(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> AppResult<StatusCode> {
    validate::validate_email(&body.email)?;

    state.auth.forgot_password(&body.email).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /auth/password/reset` — set a new password with an emailed reset
/// token; opens a new session on success.
pub async fn reset_password_handler(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> AppResult<Json<TokenResponse>> {
    validate::validate_email(&body.email)?;
    validate::validate_new_password(&body.password)?;

    let pair = state
        .auth
        .reset_password(&body.email, &body.password, &body.token)
        .await?;
    Ok(Json(pair.into()))
}
