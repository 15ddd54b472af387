//! PostgreSQL storage adapters via sqlx.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{ResetTokenStore, UserStore};
use crate::auth::AuthError;
use crate::models::auth::{ResetToken, User};

/// Row shape shared by the user queries.
type UserRow = (
    String,
    String,
    String,
    Option<String>,
    Vec<String>,
    bool,
    DateTime<Utc>,
);

const USER_COLUMNS: &str =
    "id::text, email, password_hash, refresh_token_hash, roles, is_email_verified, created_at";

fn user_from_row(row: UserRow) -> User {
    let (id, email, password_hash, refresh_token_hash, roles, is_email_verified, created_at) = row;
    User {
        id,
        email,
        password_hash,
        refresh_token_hash,
        roles,
        is_email_verified,
        created_at,
    }
}

/// User store backed by the `users` table.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(user_from_row))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1::uuid"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(user_from_row))
    }

    async fn create(
        &self,
        email: &str,
        password_hash: &str,
        roles: &[String],
    ) -> Result<User, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (id, email, password_hash, roles) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .bind(roles)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AuthError::EmailTaken,
            _ => AuthError::Db(e),
        })?;
        Ok(user_from_row(row))
    }

    async fn set_refresh_token_hash(
        &self,
        id: &str,
        hash: Option<&str>,
    ) -> Result<(), AuthError> {
        let result = sqlx::query("UPDATE users SET refresh_token_hash = $2 WHERE id = $1::uuid")
            .bind(id)
            .bind(hash)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AuthError::UserNotFound);
        }
        Ok(())
    }

    async fn set_password_hash(&self, id: &str, password_hash: &str) -> Result<(), AuthError> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1::uuid")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AuthError::UserNotFound);
        }
        Ok(())
    }

    async fn set_email_verified(&self, id: &str) -> Result<(), AuthError> {
        let result = sqlx::query("UPDATE users SET is_email_verified = TRUE WHERE id = $1::uuid")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AuthError::UserNotFound);
        }
        Ok(())
    }
}

/// Reset-token store backed by the `password_resets` table.
#[derive(Debug, Clone)]
pub struct PgResetTokenStore {
    pool: PgPool,
}

impl PgResetTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResetTokenStore for PgResetTokenStore {
    async fn create(&self, user_id: &str, token: &str) -> Result<ResetToken, AuthError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM password_resets WHERE user_id = $1::uuid")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        // Time-ordered id; reset records are append-style.
        let created_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            "INSERT INTO password_resets (id, user_id, token) \
             VALUES ($1, $2::uuid, $3) \
             RETURNING created_at",
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(token)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ResetToken {
            user_id: user_id.to_string(),
            token: token.to_string(),
            created_at,
        })
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Option<ResetToken>, AuthError> {
        let row = sqlx::query_as::<_, (String, DateTime<Utc>)>(
            "SELECT token, created_at FROM password_resets WHERE user_id = $1::uuid",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(token, created_at)| ResetToken {
            user_id: user_id.to_string(),
            token,
            created_at,
        }))
    }
}
