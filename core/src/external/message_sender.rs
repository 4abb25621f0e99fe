use async_trait::async_trait;
use lettre::message::Message as SmtpMessage;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{SmtpTransport, Transport};
use serde::{Deserialize, Serialize};

use crate::contracts::CoreError;
use crate::data_models::lead::ChannelKind;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SendOutcome {
    pub delivered: bool,
    pub message_id: Option<String>,
    pub failure_reason: Option<String>,
}

/// # NDOC
/// component: `external::message_sender`
/// purpose: Non-blocking, per-channel delivery contract. Backpressure is
///   communicated to the caller via `SendOutcome::delivered = false`, never
///   by blocking.
#[async_trait]
pub trait MessageSender: Send + Sync {
    fn name(&self) -> &'static str;
    fn is_available(&self) -> bool;
    async fn send(
        &self,
        channel: ChannelKind,
        destination: &str,
        payload: &str,
    ) -> Result<SendOutcome, CoreError>;
}

/// SMTP-backed sender for the `email` channel, gated on
/// `LEADLOOP_SMTP_HOST`/`LEADLOOP_SMTP_USER`/`LEADLOOP_SMTP_PASSWORD` being
/// configured. Other channels always report `delivered: false`.
pub struct SmtpMessageSender {
    host: Option<String>,
    user: Option<String>,
    password: Option<String>,
    from: String,
}

impl SmtpMessageSender {
    pub fn new(host: Option<String>, user: Option<String>, password: Option<String>, from: String) -> Self {
        Self {
            host,
            user,
            password,
            from,
        }
    }
}

#[async_trait]
impl MessageSender for SmtpMessageSender {
    fn name(&self) -> &'static str {
        "smtp"
    }

    fn is_available(&self) -> bool {
        self.host.is_some() && self.user.is_some() && self.password.is_some()
    }

    async fn send(
        &self,
        channel: ChannelKind,
        destination: &str,
        payload: &str,
    ) -> Result<SendOutcome, CoreError> {
        if channel != ChannelKind::Email {
            return Ok(SendOutcome {
                delivered: false,
                message_id: None,
                failure_reason: Some(format!("smtp sender does not support channel {:?}", channel)),
            });
        }
        let (Some(host), Some(user), Some(password)) =
            (self.host.as_ref(), self.user.as_ref(), self.password.as_ref())
        else {
            return Ok(SendOutcome {
                delivered: false,
                message_id: None,
                failure_reason: Some("smtp sender is not configured".to_string()),
            });
        };

        let email = SmtpMessage::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| CoreError::validation(format!("invalid from address: {e}")))?,
            )
            .to(destination
                .parse()
                .map_err(|e| CoreError::validation(format!("invalid destination address: {e}")))?)
            .subject("leadloop outbound message")
            .body(payload.to_string())
            .map_err(|e| CoreError::validation(format!("failed to build message: {e}")))?;

        let creds = Credentials::new(user.clone(), password.clone());
        let mailer = SmtpTransport::relay(host)
            .map_err(|e| CoreError::external_unavailable(format!("smtp relay setup failed: {e}")))?
            .credentials(creds)
            .build();

        match mailer.send(&email) {
            Ok(_) => Ok(SendOutcome {
                delivered: true,
                message_id: Some(uuid::Uuid::new_v4().to_string()),
                failure_reason: None,
            }),
            Err(e) => Ok(SendOutcome {
                delivered: false,
                message_id: None,
                failure_reason: Some(e.to_string()),
            }),
        }
    }
}
