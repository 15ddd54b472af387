//! Password-reset token generation and expiry.

use chrono::{DateTime, Utc};
use rand::{Rng, rng};

/// Reset-token alphabet: uppercase alphanumerics, readable in an email.
const RESET_TOKEN_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Reset-token length (e.g. "OCD7M2").
const RESET_TOKEN_LEN: usize = 6;

/// How long a reset token stays valid, in milliseconds.
pub const RESET_TOKEN_MAX_AGE_MS: i64 = 5 * 60 * 1000;

/// Generate an opaque reset token from the thread-local CSPRNG.
pub fn generate_reset_token() -> String {
    let mut rng = rng();
    (0..RESET_TOKEN_LEN)
        .map(|_| RESET_TOKEN_CHARS[rng.random_range(0..RESET_TOKEN_CHARS.len())] as char)
        .collect()
}

/// Whether a token created at `created_at` is expired at `now`.
///
/// Strict greater-than: a token aged exactly [`RESET_TOKEN_MAX_AGE_MS`]
/// is still valid.
pub fn is_expired(created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(created_at).num_milliseconds() > RESET_TOKEN_MAX_AGE_MS
}
