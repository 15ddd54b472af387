//! Password and token-fingerprint hashing via bcrypt.

use sha2::{Digest, Sha256};

use super::AuthError;

/// bcrypt cost factor.
const BCRYPT_COST: u32 = 10;

/// Hash a password with bcrypt (cost 10).
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
}

/// Verify a password against a bcrypt digest.
///
/// A malformed digest is an error, not a mismatch.
pub fn verify_password(password: &str, digest: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, digest).map_err(|_| AuthError::HashFormat)
}

/// SHA-256 hex pre-hash. Bounds the input handed to bcrypt, which only
/// reads the first 72 bytes; signed tokens are longer than that.
fn fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Hash a token fingerprint with bcrypt (cost 10) for storage.
pub fn hash_token(token: &str) -> Result<String, AuthError> {
    bcrypt::hash(fingerprint(token), BCRYPT_COST)
        .map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
}

/// Verify a token against a stored fingerprint digest.
pub fn verify_token(token: &str, digest: &str) -> Result<bool, AuthError> {
    bcrypt::verify(fingerprint(token), digest).map_err(|_| AuthError::HashFormat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let digest = hash_password("Passw0rd!").unwrap();
        assert!(verify_password("Passw0rd!", &digest).unwrap());
        assert!(!verify_password("passw0rd!", &digest).unwrap());
    }

    #[test]
    fn malformed_digest_is_an_error() {
        let err = verify_password("Passw0rd!", "not-a-bcrypt-digest").unwrap_err();
        assert!(matches!(err, AuthError::HashFormat));
    }

    #[test]
    fn token_fingerprint_round_trip() {
        // Longer than bcrypt's 72-byte input limit; the pre-hash bounds it.
        let token = "x".repeat(300);
        let digest = hash_token(&token).unwrap();
        assert!(verify_token(&token, &digest).unwrap());
        assert!(!verify_token("some other token", &digest).unwrap());
    }
}
