//! Email delivery over SMTP with implicit TLS.

use crate::config::EmailConfig;
use crate::core::{FormatHint, Notification};
use crate::notification::{Channel, NotifyError};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info, instrument};

/// SMTPS port used for every relay.
pub const SMTP_PORT: u16 = 465;

/// Sends each notification as one email through the sender's relay.
pub struct EmailChannel {
    user: Option<String>,
    password: Option<String>,
    to: Option<String>,
    smtp_server: Option<String>,
    sender_name: String,
}

/// Everything needed for one SMTP session, validated up front.
#[derive(Debug)]
struct Envelope {
    relay: String,
    credentials: Credentials,
    message: Message,
}

impl EmailChannel {
    pub fn from_config(config: &EmailConfig) -> Self {
        Self {
            user: config.user.clone(),
            password: config.password.clone(),
            to: config.to.clone(),
            smtp_server: config.smtp_server.clone(),
            sender_name: config.sender_name.clone(),
        }
    }

    /// The explicit relay, or `smtp.<domain>` derived from the sender address.
    pub fn relay_host(&self) -> Result<String, NotifyError> {
        if let Some(server) = &self.smtp_server {
            return Ok(server.clone());
        }
        let user = self.user.as_deref().unwrap_or_default();
        match user.split_once('@') {
            Some((_, domain)) if !domain.is_empty() => Ok(format!("smtp.{}", domain)),
            _ => Err(NotifyError::InvalidConfiguration(format!(
                "cannot derive SMTP server from sender address '{}'",
                user
            ))),
        }
    }

    /// The `From` address. A login that is not a mailbox is accepted when the
    /// relay is configured explicitly and becomes `<login>@<relay>`.
    fn sender_address(&self, user: &str, relay: &str) -> Result<Address, NotifyError> {
        match user.parse::<Address>() {
            Ok(address) => Ok(address),
            Err(_) if self.smtp_server.is_some() && !user.contains('@') => {
                Address::new(user, relay).map_err(|e| {
                    NotifyError::InvalidConfiguration(format!(
                        "invalid sender login '{}' for relay '{}': {}",
                        user, relay, e
                    ))
                })
            }
            Err(e) => Err(NotifyError::InvalidConfiguration(format!(
                "invalid sender address '{}': {}",
                user, e
            ))),
        }
    }

    fn build_envelope(&self, notification: &Notification) -> Result<Envelope, NotifyError> {
        let (Some(user), Some(password), Some(to)) = (
            self.user.as_deref(),
            self.password.as_deref(),
            self.to.as_deref(),
        ) else {
            return Err(NotifyError::ConfigurationMissing(
                "Email configuration not set".into(),
            ));
        };

        let relay = self.relay_host()?;
        let sender = self.sender_address(user, &relay)?;

        let content_type = match notification.format {
            FormatHint::Text => ContentType::TEXT_PLAIN,
            FormatHint::Html => ContentType::TEXT_HTML,
        };

        let mut builder = Message::builder()
            .from(Mailbox::new(Some(self.sender_name.clone()), sender))
            .subject(notification.title.as_str())
            .header(content_type);

        for recipient in to.split(',').map(str::trim).filter(|r| !r.is_empty()) {
            let mailbox: Mailbox = recipient.parse().map_err(|e| {
                NotifyError::InvalidConfiguration(format!(
                    "invalid recipient address '{}': {}",
                    recipient, e
                ))
            })?;
            builder = builder.to(mailbox);
        }

        let message = builder
            .body(notification.content.clone())
            .map_err(|e| NotifyError::InvalidConfiguration(format!("cannot build email: {}", e)))?;

        Ok(Envelope {
            relay,
            credentials: Credentials::new(user.to_string(), password.to_string()),
            message,
        })
    }

    /// Connects over implicit TLS, logs in and sends. The transport is
    /// dropped, closing the session, on every path out of this function.
    async fn deliver(envelope: Envelope) -> Result<(), NotifyError> {
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&envelope.relay)?
            .port(SMTP_PORT)
            .credentials(envelope.credentials)
            .build();

        match mailer.send(envelope.message).await {
            Ok(_) => {
                info!(relay = %envelope.relay, "Successfully sent notification email.");
                Ok(())
            }
            Err(e) => {
                error!(relay = %envelope.relay, error = %e, "SMTP delivery failed");
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl Channel for EmailChannel {
    fn name(&self) -> &str {
        "Email"
    }

    fn is_configured(&self) -> bool {
        self.user.is_some() && self.password.is_some() && self.to.is_some()
    }

    #[instrument(skip_all, fields(channel = "Email"))]
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let envelope = self.build_envelope(notification)?;
        Self::deliver(envelope).await
    }
}
