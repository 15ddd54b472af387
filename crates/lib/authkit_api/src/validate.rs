//! Request validation, applied in handlers before the core flows run.

use crate::error::AppError;

/// Longest email accepted, per RFC 5321's path limit.
const MAX_EMAIL_LEN: usize = 254;

/// Shortest password accepted.
const MIN_PASSWORD_LEN: usize = 8;

/// Validate an email address shape.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    let shape_ok = email.len() <= MAX_EMAIL_LEN
        && !email.chars().any(char::is_whitespace)
        && matches!(
            email.split_once('@'),
            Some((local, domain))
                if !local.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
        );
    if shape_ok {
        Ok(())
    } else {
        Err(AppError::Validation("Invalid email address".into()))
    }
}

/// Validate the strength of a newly chosen password: at least 8 chars with
/// one lowercase letter, one uppercase letter, and one digit.
pub fn validate_new_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(AppError::Validation(
            "Password must contain a lowercase letter".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(AppError::Validation(
            "Password must contain an uppercase letter".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation("Password must contain a digit".into()));
    }
    Ok(())
}
