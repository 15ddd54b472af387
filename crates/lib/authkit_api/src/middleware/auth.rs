//! Bearer-token middleware — extraction and JWT verification for both
//! token kinds.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use authkit_core::auth::jwt::TokenKind;
use authkit_core::models::auth::TokenClaims;

use crate::AppState;
use crate::error::AppError;

/// Verified access-token claims, stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub TokenClaims);

/// Verified refresh-token claims plus the raw presented token, stored in
/// request extensions. The handler still authenticates the raw token
/// against the stored fingerprint; this middleware only checks the
/// signature and expiry.
#[derive(Debug, Clone)]
pub struct RefreshSession {
    pub claims: TokenClaims,
    pub token: String,
}

fn bearer_token(request: &Request) -> Result<&str, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;
    header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization scheme".into()))
}

/// Axum middleware: extracts `Authorization: Bearer <token>`, verifies the
/// access JWT, and injects [`AuthenticatedUser`] into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)?;
    let claims = state
        .signer
        .verify(token, TokenKind::Access)
        .map_err(|err| {
            tracing::debug!(error = %err, "access token rejected");
            AppError::Unauthorized("Invalid or expired token".into())
        })?;

    request.extensions_mut().insert(AuthenticatedUser(claims));

    Ok(next.run(request).await)
}

/// Axum middleware: verifies the refresh JWT from the bearer header and
/// injects [`RefreshSession`] into request extensions.
pub async fn require_refresh(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)?.to_string();
    let claims = state
        .signer
        .verify(&token, TokenKind::Refresh)
        .map_err(|err| {
            tracing::debug!(error = %err, "refresh token rejected");
            AppError::Unauthorized("Refresh token is not valid".into())
        })?;

    request
        .extensions_mut()
        .insert(RefreshSession { claims, token });

    Ok(next.run(request).await)
}
