//! Transactional email delivery
//!
//! Real delivery goes through the SendGrid v3 API. Without an API key
//! (development, tests) the [`LogMailer`] just writes the message to
//! the log, so the trigger paths stay exercised end to end.

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail transport error: {0}")]
    Transport(String),

    #[error("Mail rejected: status {0}")]
    Rejected(u16),
}

pub type MailResult<T> = Result<T, MailError>;

/// A fully composed outgoing message
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> MailResult<()>;
}

/// SendGrid v3 `POST /v3/mail/send`
pub struct SendgridMailer {
    client: reqwest::Client,
    api_key: String,
    from_email: String,
}

impl SendgridMailer {
    const ENDPOINT: &'static str = "https://api.sendgrid.com/v3/mail/send";

    pub fn new(api_key: String, from_email: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            from_email,
        }
    }
}

#[async_trait]
impl Mailer for SendgridMailer {
    async fn send(&self, email: OutgoingEmail) -> MailResult<()> {
        let payload = json!({
            "personalizations": [{ "to": [{ "email": email.to }] }],
            "from": { "email": self.from_email },
            "subject": email.subject,
            "content": [{ "type": "text/plain", "value": email.body }],
        });

        let response = self
            .client
            .post(Self::ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(MailError::Rejected(response.status().as_u16()))
        }
    }
}

/// Logs instead of sending; the development and test mailer
#[derive(Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> MailResult<()> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "Email (log only): {}",
            email.body
        );
        Ok(())
    }
}
