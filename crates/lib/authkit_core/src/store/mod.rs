//! Storage ports and adapters.
//!
//! The auth flows run over trait objects so the HTTP layer and tests can
//! inject different backends: `store::pg` for PostgreSQL, `store::memory`
//! for tests and local development.

pub mod memory;
pub mod pg;

use async_trait::async_trait;

use crate::auth::AuthError;
use crate::models::auth::{ResetToken, User};

/// User persistence port.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AuthError>;

    /// Create a user with no active session. Fails `EmailTaken` on a
    /// duplicate email.
    async fn create(
        &self,
        email: &str,
        password_hash: &str,
        roles: &[String],
    ) -> Result<User, AuthError>;

    /// Overwrite the stored refresh-token fingerprint. `None` clears the
    /// active session.
    async fn set_refresh_token_hash(&self, id: &str, hash: Option<&str>)
    -> Result<(), AuthError>;

    async fn set_password_hash(&self, id: &str, password_hash: &str) -> Result<(), AuthError>;

    async fn set_email_verified(&self, id: &str) -> Result<(), AuthError>;
}

/// Reset-token persistence port.
#[async_trait]
pub trait ResetTokenStore: Send + Sync {
    /// Create a token for the user, deleting any prior tokens first — at
    /// most one live reset token per user.
    async fn create(&self, user_id: &str, token: &str) -> Result<ResetToken, AuthError>;

    async fn find_by_user(&self, user_id: &str) -> Result<Option<ResetToken>, AuthError>;
}
