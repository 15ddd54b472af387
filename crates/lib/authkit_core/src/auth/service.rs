//! Credential flows — signup/signin, refresh rotation, logout, email
//! verification, and password reset, composed over the storage and mail
//! ports.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use super::jwt::TokenSigner;
use super::{AuthError, password, reset};
use crate::mail::{self, MailMessage, Mailer};
use crate::models::auth::{DEFAULT_ROLE, TokenPair, User};
use crate::store::{ResetTokenStore, UserStore};

/// Fixed response for every verification failure; causes are never
/// distinguished in the reply.
const VERIFY_EMAIL_FAILURE: &str = "Invalid action";

/// Fixed response for a successful email verification.
const VERIFY_EMAIL_SUCCESS: &str = "Success! Account verified now, you need to login.";

/// Orchestrates the credential flows over injected ports.
///
/// No per-user locking: two concurrent refresh calls for the same user can
/// both pass the fingerprint check, and the last write wins.
pub struct AuthService {
    users: Arc<dyn UserStore>,
    reset_tokens: Arc<dyn ResetTokenStore>,
    mailer: Arc<dyn Mailer>,
    signer: Arc<TokenSigner>,
    base_url: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        reset_tokens: Arc<dyn ResetTokenStore>,
        mailer: Arc<dyn Mailer>,
        signer: Arc<TokenSigner>,
        base_url: String,
    ) -> Self {
        Self {
            users,
            reset_tokens,
            mailer,
            signer,
            base_url,
        }
    }

    /// Register a new account and open its first session.
    ///
    /// The activation email embeds the stored refresh-token fingerprint as
    /// the verification token.
    pub async fn signup(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        if self.users.find_by_email(email).await?.is_some() {
            debug!(email, "signup attempt with a used email address");
            return Err(AuthError::EmailTaken);
        }

        let password_hash = password::hash_password(password)?;
        let user = self
            .users
            .create(email, &password_hash, &[DEFAULT_ROLE.to_string()])
            .await?;
        debug!(email, "user signed up");

        let pair = self.signer.issue_pair(&user)?;
        let token_hash = password::hash_token(&pair.refresh_token)?;
        self.users
            .set_refresh_token_hash(&user.id, Some(&token_hash))
            .await?;

        match mail::account_activation(&user, &token_hash, &self.base_url) {
            Ok(message) => self.dispatch(message).await,
            Err(err) => warn!(error = %err, "could not build activation mail"),
        }

        Ok(pair)
    }

    /// Authenticate with email + password, opening a new session.
    pub async fn signin(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::EmailNotFound)?;

        if !password::verify_password(password, &user.password_hash)? {
            debug!(email, "signin with wrong password");
            return Err(AuthError::InvalidPassword);
        }
        debug!(email, "user signed in");

        self.rotate_session(&user).await
    }

    /// Exchange a refresh token for a new pair (single-use rotation).
    ///
    /// The presented token is authenticated against the stored fingerprint,
    /// not by its signature; once superseded it can never match again.
    pub async fn refresh(&self, email: &str, presented: &str) -> Result<TokenPair, AuthError> {
        let user = self.user_with_valid_refresh_token(email, presented).await?;
        self.rotate_session(&user).await
    }

    /// Close the active session: same validation as refresh, then clear the
    /// stored fingerprint so every outstanding refresh token is dead until
    /// the next signin.
    pub async fn logout(&self, email: &str, presented: &str) -> Result<(), AuthError> {
        let user = self.user_with_valid_refresh_token(email, presented).await?;
        self.users.set_refresh_token_hash(&user.id, None).await?;
        debug!(email, "user logged out");
        Ok(())
    }

    /// Verify an account from the emailed link.
    ///
    /// Best-effort: every failure collapses into one generic message; the
    /// real cause goes to the log only.
    pub async fn verify_email(&self, email: &str, hash: &str) -> &'static str {
        match self.try_verify_email(email, hash).await {
            Ok(()) => VERIFY_EMAIL_SUCCESS,
            Err(err) => {
                debug!(email, error = %err, "email verification rejected");
                VERIFY_EMAIL_FAILURE
            }
        }
    }

    async fn try_verify_email(&self, email: &str, hash: &str) -> Result<(), AuthError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::EmailNotFound)?;
        match user.refresh_token_hash.as_deref() {
            Some(stored) if stored == hash => {}
            _ => return Err(AuthError::TokenInvalid),
        }
        self.users.set_email_verified(&user.id).await?;
        Ok(())
    }

    /// Issue a reset token and email it to the user. Any prior token for
    /// the user is deleted first.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let token = reset::generate_reset_token();
        let record = self.reset_tokens.create(&user.id, &token).await?;
        debug!(email, "issued password-reset token");

        self.dispatch(mail::password_reset(&user, &record.token)).await;
        Ok(())
    }

    /// Set a new password using an emailed reset token, opening a new
    /// session on success.
    pub async fn reset_password(
        &self,
        email: &str,
        new_password: &str,
        token: &str,
    ) -> Result<TokenPair, AuthError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let record = self.reset_tokens.find_by_user(&user.id).await?;
        let record = match record {
            Some(record) if record.token == token => record,
            _ => return Err(AuthError::InvalidResetToken),
        };
        if reset::is_expired(record.created_at, Utc::now()) {
            return Err(AuthError::ResetTokenExpired);
        }

        let password_hash = password::hash_password(new_password)?;
        self.users.set_password_hash(&user.id, &password_hash).await?;
        debug!(email, "password reset");

        self.rotate_session(&user).await
    }

    /// Issue a fresh pair and overwrite the stored refresh fingerprint.
    async fn rotate_session(&self, user: &User) -> Result<TokenPair, AuthError> {
        let pair = self.signer.issue_pair(user)?;
        let token_hash = password::hash_token(&pair.refresh_token)?;
        self.users
            .set_refresh_token_hash(&user.id, Some(&token_hash))
            .await?;
        Ok(pair)
    }

    /// Load the user and authenticate the presented refresh token against
    /// the stored fingerprint.
    async fn user_with_valid_refresh_token(
        &self,
        email: &str,
        presented: &str,
    ) -> Result<User, AuthError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        let stored = user
            .refresh_token_hash
            .as_deref()
            .ok_or(AuthError::InvalidRefreshToken)?;
        if !password::verify_token(presented, stored)? {
            debug!(email, "refresh token does not match stored fingerprint");
            return Err(AuthError::InvalidRefreshToken);
        }
        Ok(user)
    }

    /// Fire-and-forget mail dispatch: a failed send is logged, never
    /// surfaced to the flow.
    async fn dispatch(&self, message: MailMessage) {
        if let Err(err) = self.mailer.send(&message).await {
            warn!(error = %err, template = message.template, "mail dispatch failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Duration;

    use super::*;
    use crate::store::memory::{MemoryResetTokenStore, MemoryUserStore};

    /// Captures dispatched mail for assertions.
    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<MailMessage>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, message: &MailMessage) -> Result<(), AuthError> {
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    struct Harness {
        service: AuthService,
        users: Arc<MemoryUserStore>,
        reset_tokens: Arc<MemoryResetTokenStore>,
        mailer: Arc<RecordingMailer>,
    }

    fn harness() -> Harness {
        let users = Arc::new(MemoryUserStore::new());
        let reset_tokens = Arc::new(MemoryResetTokenStore::new());
        let mailer = Arc::new(RecordingMailer::default());
        let signer = Arc::new(TokenSigner::new(
            b"access-test-secret",
            b"refresh-test-secret",
        ));
        let service = AuthService::new(
            users.clone(),
            reset_tokens.clone(),
            mailer.clone(),
            signer,
            "http://localhost:3100".to_string(),
        );
        Harness {
            service,
            users,
            reset_tokens,
            mailer,
        }
    }

    const EMAIL: &str = "a@x.com";
    const PASSWORD: &str = "Passw0rd!";

    #[tokio::test]
    async fn signup_then_signin_returns_a_fresh_pair() {
        let h = harness();
        let first = h.service.signup(EMAIL, PASSWORD).await.unwrap();
        let second = h.service.signin(EMAIL, PASSWORD).await.unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);
    }

    #[tokio::test]
    async fn duplicate_signup_is_rejected() {
        let h = harness();
        h.service.signup(EMAIL, PASSWORD).await.unwrap();
        let err = h.service.signup(EMAIL, "Another1!").await.unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn signup_dispatches_activation_mail_with_the_stored_fingerprint() {
        let h = harness();
        h.service.signup(EMAIL, PASSWORD).await.unwrap();

        let message = {
            let sent = h.mailer.sent.lock().unwrap();
            assert_eq!(sent.len(), 1);
            sent[0].clone()
        };
        assert_eq!(message.to, EMAIL);
        assert_eq!(message.template, "activation");

        // The link token is exactly the digest persisted on the user.
        let user = h.users.find_by_email(EMAIL).await.unwrap().unwrap();
        let stored = user.refresh_token_hash.unwrap();
        let url = url::Url::parse(message.context["url"].as_str().unwrap()).unwrap();
        let hash = url
            .query_pairs()
            .find(|(k, _)| k == "hash")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        assert_eq!(hash, stored);
    }

    #[tokio::test]
    async fn refresh_rotates_the_session() {
        let h = harness();
        let first = h.service.signup(EMAIL, PASSWORD).await.unwrap();

        let second = h.service.refresh(EMAIL, &first.refresh_token).await.unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);

        // The used token is permanently dead.
        let err = h
            .service
            .refresh(EMAIL, &first.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidRefreshToken));

        // The replacement works.
        h.service.refresh(EMAIL, &second.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn signin_supersedes_the_signup_refresh_token() {
        let h = harness();
        let t1 = h.service.signup(EMAIL, PASSWORD).await.unwrap();
        let t2 = h.service.signin(EMAIL, PASSWORD).await.unwrap();
        assert_ne!(t1.refresh_token, t2.refresh_token);

        let err = h.service.refresh(EMAIL, &t1.refresh_token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidRefreshToken));
    }

    #[tokio::test]
    async fn logout_invalidates_all_refresh_attempts() {
        let h = harness();
        let pair = h.service.signup(EMAIL, PASSWORD).await.unwrap();

        let err = h.service.logout(EMAIL, "not-the-token").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidRefreshToken));

        h.service.logout(EMAIL, &pair.refresh_token).await.unwrap();
        let user = h.users.find_by_email(EMAIL).await.unwrap().unwrap();
        assert!(user.refresh_token_hash.is_none());

        let err = h
            .service
            .refresh(EMAIL, &pair.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidRefreshToken));
    }

    #[tokio::test]
    async fn verify_email_collapses_every_failure_into_one_message() {
        let h = harness();
        h.service.signup(EMAIL, PASSWORD).await.unwrap();

        let wrong_hash = h.service.verify_email(EMAIL, "wrong-hash").await;
        let unknown_email = h.service.verify_email("nobody@x.com", "anything").await;
        assert_eq!(wrong_hash, unknown_email);
        assert_eq!(wrong_hash, "Invalid action");

        let user = h.users.find_by_email(EMAIL).await.unwrap().unwrap();
        assert!(!user.is_email_verified);
    }

    #[tokio::test]
    async fn verify_email_with_the_stored_digest_flips_the_flag() {
        let h = harness();
        h.service.signup(EMAIL, PASSWORD).await.unwrap();

        let user = h.users.find_by_email(EMAIL).await.unwrap().unwrap();
        let hash = user.refresh_token_hash.unwrap();

        let reply = h.service.verify_email(EMAIL, &hash).await;
        assert_eq!(reply, "Success! Account verified now, you need to login.");

        let user = h.users.find_by_email(EMAIL).await.unwrap().unwrap();
        assert!(user.is_email_verified);
    }

    #[tokio::test]
    async fn forgot_password_keeps_a_single_live_token() {
        let h = harness();
        h.service.signup(EMAIL, PASSWORD).await.unwrap();

        h.service.forgot_password(EMAIL).await.unwrap();
        h.service.forgot_password(EMAIL).await.unwrap();

        assert_eq!(h.reset_tokens.len(), 1);

        // The surviving record is the one from the latest mail.
        let user = h.users.find_by_email(EMAIL).await.unwrap().unwrap();
        let record = h
            .reset_tokens
            .find_by_user(&user.id)
            .await
            .unwrap()
            .unwrap();
        let sent = h.mailer.sent.lock().unwrap();
        let last = sent.last().unwrap();
        assert_eq!(last.template, "reset-password");
        assert_eq!(last.context["token"], record.token.as_str());
    }

    #[tokio::test]
    async fn reset_password_opens_a_fresh_session() {
        let h = harness();
        h.service.signup(EMAIL, PASSWORD).await.unwrap();
        h.service.forgot_password(EMAIL).await.unwrap();

        let user = h.users.find_by_email(EMAIL).await.unwrap().unwrap();
        let token = h
            .reset_tokens
            .find_by_user(&user.id)
            .await
            .unwrap()
            .unwrap()
            .token;

        let pair = h
            .service
            .reset_password(EMAIL, "NewPassw0rd!", &token)
            .await
            .unwrap();

        // The returned pair is live against the new fingerprint.
        h.service.refresh(EMAIL, &pair.refresh_token).await.unwrap();

        // Old password is gone, the new one works.
        let err = h.service.signin(EMAIL, PASSWORD).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidPassword));
        h.service.signin(EMAIL, "NewPassw0rd!").await.unwrap();
    }

    #[tokio::test]
    async fn reset_password_rejects_a_wrong_or_missing_token() {
        let h = harness();
        h.service.signup(EMAIL, PASSWORD).await.unwrap();

        // No token issued yet.
        let err = h
            .service
            .reset_password(EMAIL, "NewPassw0rd!", "OCD7M2")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidResetToken));

        h.service.forgot_password(EMAIL).await.unwrap();
        let err = h
            .service
            .reset_password(EMAIL, "NewPassw0rd!", "not-it")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidResetToken));
    }

    #[tokio::test]
    async fn reset_password_rejects_an_expired_token() {
        let h = harness();
        h.service.signup(EMAIL, PASSWORD).await.unwrap();
        h.service.forgot_password(EMAIL).await.unwrap();

        let user = h.users.find_by_email(EMAIL).await.unwrap().unwrap();
        let token = {
            let mut entry = h.reset_tokens.tokens.get_mut(&user.id).unwrap();
            entry.created_at = entry.created_at - Duration::minutes(10);
            entry.token.clone()
        };

        let err = h
            .service
            .reset_password(EMAIL, "NewPassw0rd!", &token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ResetTokenExpired));
    }

    #[tokio::test]
    async fn unknown_email_fails_every_flow_with_its_own_kind() {
        let h = harness();

        let err = h.service.signin(EMAIL, PASSWORD).await.unwrap_err();
        assert!(matches!(err, AuthError::EmailNotFound));

        let err = h.service.refresh(EMAIL, "token").await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));

        let err = h.service.logout(EMAIL, "token").await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));

        let err = h.service.forgot_password(EMAIL).await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));

        let err = h
            .service
            .reset_password(EMAIL, PASSWORD, "OCD7M2")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
    }
}
