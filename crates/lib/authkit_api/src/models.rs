//! API request/response models.
//!
//! Response bodies use camelCase field names (the wire shape clients
//! already consume); domain models live in `authkit_core::models`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use authkit_core::models::auth::{TokenPair, User};

/// JSON error body returned by every failing route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub password: String,
    /// Token from the reset email; valid for 5 minutes.
    pub token: String,
}

/// Query parameters of the emailed verification link.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyEmailParams {
    pub email: String,
    pub hash: String,
}

/// Token pair returned by signup/signin/refresh/reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }
    }
}

/// Current user's profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub roles: Vec<String>,
    pub is_email_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            roles: user.roles,
            is_email_verified: user.is_email_verified,
            created_at: user.created_at,
        }
    }
}
