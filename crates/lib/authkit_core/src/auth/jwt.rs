//! JWT token generation and verification.

use std::path::PathBuf;

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::info;
use uuid::Uuid;

use super::AuthError;
use crate::models::auth::{TokenClaims, TokenPair, User};

/// Access token lifetime: 15 minutes.
pub const ACCESS_TOKEN_EXPIRY_SECS: i64 = 15 * 60;

/// Refresh token lifetime: 24 hours.
pub const REFRESH_TOKEN_EXPIRY_SECS: i64 = 60 * 60 * 24;

/// Which of the two independent signing keys a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Issues and verifies the access/refresh token pair (HS256).
///
/// The two kinds are signed with independent keys, so a refresh token can
/// never validate as an access token and vice versa.
pub struct TokenSigner {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
}

impl TokenSigner {
    pub fn new(access_secret: &[u8], refresh_secret: &[u8]) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret),
            access_decoding: DecodingKey::from_secret(access_secret),
            refresh_encoding: EncodingKey::from_secret(refresh_secret),
            refresh_decoding: DecodingKey::from_secret(refresh_secret),
        }
    }

    /// Issue a fresh token pair for the user.
    ///
    /// Refresh claims carry a UUIDv4 `jti`: the stored fingerprint must be
    /// able to tell any two refresh tokens apart, including two issued for
    /// identical claims within the same second.
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, AuthError> {
        let now = Utc::now();
        let access = TokenClaims {
            sub: user.id.clone(),
            email: user.email.clone(),
            roles: user.roles.clone(),
            is_email_verified: user.is_email_verified,
            exp: (now + Duration::seconds(ACCESS_TOKEN_EXPIRY_SECS)).timestamp(),
            iat: now.timestamp(),
            jti: None,
        };
        let refresh = TokenClaims {
            exp: (now + Duration::seconds(REFRESH_TOKEN_EXPIRY_SECS)).timestamp(),
            jti: Some(Uuid::new_v4().to_string()),
            ..access.clone()
        };
        Ok(TokenPair {
            access_token: encode(&Header::default(), &access, &self.access_encoding)
                .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))?,
            refresh_token: encode(&Header::default(), &refresh, &self.refresh_encoding)
                .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))?,
        })
    }

    /// Verify a token of the expected kind, returning the claims on success.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<TokenClaims, AuthError> {
        let key = match kind {
            TokenKind::Access => &self.access_decoding,
            TokenKind::Refresh => &self.refresh_decoding,
        };
        let mut validation = Validation::default();
        validation.validate_exp = true;
        decode::<TokenClaims>(token, key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid,
            })
    }
}

/// Resolve a signing secret: named env var → persisted file → generated.
///
/// Generated secrets are 64 alphanumeric chars, persisted under the
/// platform data dir so restarts keep sessions valid.
pub fn resolve_secret(env_var: &str, file_name: &str) -> String {
    if let Ok(secret) = std::env::var(env_var)
        && !secret.is_empty()
    {
        return secret;
    }
    let secret_path = secret_path(file_name);
    if let Ok(existing) = std::fs::read_to_string(&secret_path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = secret_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(&secret_path, &secret);
    info!(path = %secret_path.display(), env_var, "generated new signing secret");
    secret
}

/// Path to a persisted signing-secret file.
fn secret_path(file_name: &str) -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("authkit")
        .join(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn signer() -> TokenSigner {
        TokenSigner::new(b"access-test-secret", b"refresh-test-secret")
    }

    fn test_user() -> User {
        User {
            id: "4b8e5d6e-0000-4000-8000-000000000001".into(),
            email: "a@x.com".into(),
            password_hash: String::new(),
            refresh_token_hash: None,
            roles: vec!["user".into()],
            is_email_verified: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn round_trip_per_kind() {
        let signer = signer();
        let pair = signer.issue_pair(&test_user()).unwrap();

        let access = signer.verify(&pair.access_token, TokenKind::Access).unwrap();
        assert_eq!(access.email, "a@x.com");
        assert_eq!(access.roles, vec!["user".to_string()]);
        assert!(access.jti.is_none());

        let refresh = signer.verify(&pair.refresh_token, TokenKind::Refresh).unwrap();
        assert_eq!(refresh.sub, access.sub);
        assert!(refresh.jti.is_some());
    }

    #[test]
    fn kinds_do_not_cross_validate() {
        let signer = signer();
        let pair = signer.issue_pair(&test_user()).unwrap();

        let err = signer.verify(&pair.refresh_token, TokenKind::Access).unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid));
        let err = signer.verify(&pair.access_token, TokenKind::Refresh).unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid));
    }

    #[test]
    fn refresh_tokens_are_never_identical() {
        let signer = signer();
        let user = test_user();
        let first = signer.issue_pair(&user).unwrap();
        let second = signer.issue_pair(&user).unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);

        let a = signer.verify(&first.refresh_token, TokenKind::Refresh).unwrap();
        let b = signer.verify(&second.refresh_token, TokenKind::Refresh).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let signer = signer();
        let now = Utc::now();
        let claims = TokenClaims {
            sub: "1".into(),
            email: "a@x.com".into(),
            roles: vec![],
            is_email_verified: false,
            exp: (now - chrono::Duration::hours(1)).timestamp(),
            iat: (now - chrono::Duration::hours(2)).timestamp(),
            jti: None,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"access-test-secret"),
        )
        .unwrap();
        let err = signer.verify(&token, TokenKind::Access).unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }
}
