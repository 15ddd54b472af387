//! Authentication and authorization logic.
//!
//! Provides credential hashing, JWT management, reset-token generation,
//! and the orchestrated auth flows shared across the API crates.

pub mod jwt;
pub mod password;
pub mod reset;
pub mod service;

use thiserror::Error;

/// Authentication errors.
///
/// Every flow failure is a distinct variant so the boundary layer can map
/// them to distinct responses. The one deliberate exception is email
/// verification, which collapses all of these into a single generic
/// message at the service level.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email already registered")]
    EmailTaken,

    #[error("e-mail not found")]
    EmailNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("password not valid")]
    InvalidPassword,

    #[error("bad refresh token")]
    InvalidRefreshToken,

    #[error("invalid reset token")]
    InvalidResetToken,

    #[error("reset token expired")]
    ResetTokenExpired,

    #[error("token expired")]
    TokenExpired,

    #[error("invalid token")]
    TokenInvalid,

    #[error("malformed credential digest")]
    HashFormat,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}
