//! In-memory storage adapters over `DashMap`.
//!
//! Used by tests and local development; not durable.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use super::{ResetTokenStore, UserStore};
use crate::auth::AuthError;
use crate::models::auth::{ResetToken, User};

/// In-memory user store keyed by user id.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    pub(crate) users: DashMap<String, User>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.value().email == email)
            .map(|entry| entry.value().clone()))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AuthError> {
        Ok(self.users.get(id).map(|entry| entry.value().clone()))
    }

    async fn create(
        &self,
        email: &str,
        password_hash: &str,
        roles: &[String],
    ) -> Result<User, AuthError> {
        if self.find_by_email(email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            refresh_token_hash: None,
            roles: roles.to_vec(),
            is_email_verified: false,
            created_at: Utc::now(),
        };
        self.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn set_refresh_token_hash(
        &self,
        id: &str,
        hash: Option<&str>,
    ) -> Result<(), AuthError> {
        let mut user = self.users.get_mut(id).ok_or(AuthError::UserNotFound)?;
        user.refresh_token_hash = hash.map(str::to_string);
        Ok(())
    }

    async fn set_password_hash(&self, id: &str, password_hash: &str) -> Result<(), AuthError> {
        let mut user = self.users.get_mut(id).ok_or(AuthError::UserNotFound)?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn set_email_verified(&self, id: &str) -> Result<(), AuthError> {
        let mut user = self.users.get_mut(id).ok_or(AuthError::UserNotFound)?;
        user.is_email_verified = true;
        Ok(())
    }
}

/// In-memory reset-token store keyed by user id.
///
/// One entry per user by construction, which is exactly the delete-prior
/// invariant the port requires.
#[derive(Debug, Default)]
pub struct MemoryResetTokenStore {
    pub(crate) tokens: DashMap<String, ResetToken>,
}

impl MemoryResetTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live tokens across all users.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl ResetTokenStore for MemoryResetTokenStore {
    async fn create(&self, user_id: &str, token: &str) -> Result<ResetToken, AuthError> {
        let record = ResetToken {
            user_id: user_id.to_string(),
            token: token.to_string(),
            created_at: Utc::now(),
        };
        self.tokens.insert(user_id.to_string(), record.clone());
        Ok(record)
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Option<ResetToken>, AuthError> {
        Ok(self.tokens.get(user_id).map(|entry| entry.value().clone()))
    }
}
