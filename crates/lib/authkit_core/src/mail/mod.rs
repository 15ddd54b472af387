//! Mail delivery port and message builders.
//!
//! The auth flows hand fully-built messages to a [`Mailer`]; the
//! implementation decides transport (SMTP, API, ...). Templates are
//! referenced by name and rendered by the delivering side.

use async_trait::async_trait;
use serde_json::json;
use tracing::info;
use url::Url;

use crate::auth::AuthError;
use crate::models::auth::User;

/// A templated outbound message.
#[derive(Debug, Clone)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub template: &'static str,
    pub context: serde_json::Value,
}

/// Mail delivery port.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a message, or return an error to mark the dispatch failed.
    async fn send(&self, message: &MailMessage) -> Result<(), AuthError>;
}

/// Dev sender that logs the message instead of delivering it.
#[derive(Debug, Clone, Default)]
pub struct TracingMailer;

#[async_trait]
impl Mailer for TracingMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), AuthError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            template = message.template,
            context = %message.context,
            "mail send stub"
        );
        Ok(())
    }
}

/// Build the account-activation message sent at signup.
///
/// The verification link embeds the email and the stored fingerprint
/// digest; `Url` handles the query encoding (bcrypt digests contain `/`
/// and `.`).
pub fn account_activation(
    user: &User,
    verification_hash: &str,
    base_url: &str,
) -> Result<MailMessage, AuthError> {
    let link = Url::parse_with_params(
        &format!("{}/auth/verify/email", base_url.trim_end_matches('/')),
        &[("email", user.email.as_str()), ("hash", verification_hash)],
    )
    .map_err(|e| AuthError::Internal(format!("verification link: {e}")))?;

    Ok(MailMessage {
        to: user.email.clone(),
        subject: "Confirm your account".to_string(),
        template: "activation",
        context: json!({
            "title": "Confirm your account",
            "app_name": "Authkit",
            "url": link.as_str(),
        }),
    })
}

/// Build the reset-password message carrying the raw reset token.
pub fn password_reset(user: &User, token: &str) -> MailMessage {
    MailMessage {
        to: user.email.clone(),
        subject: "Reset your password".to_string(),
        template: "reset-password",
        context: json!({
            "title": "Reset your password",
            "app_name": "Authkit",
            "token": token,
            "valid_for": "5 minutes",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_user() -> User {
        User {
            id: "u-1".into(),
            email: "a@x.com".into(),
            password_hash: String::new(),
            refresh_token_hash: None,
            roles: vec![],
            is_email_verified: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn activation_link_encodes_the_digest() {
        let digest = "$2b$10$abc/def.ghi";
        let message =
            account_activation(&test_user(), digest, "http://localhost:3100/").unwrap();
        let url = message.context["url"].as_str().unwrap();
        assert!(url.starts_with("http://localhost:3100/auth/verify/email?"));
        assert!(url.contains("email=a%40x.com"));
        // The raw digest must not appear unescaped in the query.
        assert!(!url.contains(digest));

        let parsed = Url::parse(url).unwrap();
        let hash = parsed
            .query_pairs()
            .find(|(k, _)| k == "hash")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        assert_eq!(hash, digest);
    }

    #[test]
    fn reset_message_carries_the_raw_token() {
        let message = password_reset(&test_user(), "OCD7M2");
        assert_eq!(message.template, "reset-password");
        assert_eq!(message.context["token"], "OCD7M2");
    }
}
