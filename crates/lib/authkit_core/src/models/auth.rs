//! Authentication domain models.
//!
//! These are internal domain models, distinct from API DTOs
//! (which carry `#[serde(rename)]` for camelCase etc.).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role granted to every user at signup.
pub const DEFAULT_ROLE: &str = "user";

/// Domain user with credential state.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    /// Fingerprint digest of the most recently issued refresh token.
    /// `None` means no active session.
    pub refresh_token_hash: Option<String>,
    pub roles: Vec<String>,
    pub is_email_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Access/refresh token pair returned by every credential flow.
///
/// Neither token is persisted; only the fingerprint of the refresh token
/// is stored on the user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject — user ID (standard JWT `sub` claim).
    pub sub: String,
    /// User email.
    pub email: String,
    /// User roles (e.g. `["user"]`).
    pub roles: Vec<String>,
    /// Whether the account's email address has been verified.
    pub is_email_verified: bool,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Unique token id, present on refresh tokens only. Keeps two refresh
    /// tokens for identical claims from ever being byte-identical.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

/// Password-reset token record.
#[derive(Debug, Clone)]
pub struct ResetToken {
    pub user_id: String,
    pub token: String,
    pub created_at: DateTime<Utc>,
}
