//! Delivery channels and the dispatcher that fans a notification out to them.
//!
//! Every channel implements [`Channel`]. The [`registry::ChannelRegistry`]
//! builds them in their fixed priority order from the loaded configuration,
//! and the [`dispatcher::Dispatcher`] attempts each one in turn, turning every
//! failure into a recorded outcome.
pub mod dispatcher;
pub mod email;
pub mod registry;
pub mod telegram;
pub mod webhook;

use crate::core::Notification;
use async_trait::async_trait;
use thiserror::Error;

pub use dispatcher::Dispatcher;
pub use registry::ChannelRegistry;

/// A single delivery channel.
#[async_trait]
pub trait Channel: Send + Sync {
    /// The name reported in status lines.
    fn name(&self) -> &str;

    /// Whether every credential this channel needs is present.
    fn is_configured(&self) -> bool;

    /// Delivers the notification. Fails with
    /// [`NotifyError::ConfigurationMissing`] before any network activity when
    /// the channel is not configured.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("{0}")]
    ConfigurationMissing(String),

    #[error("{0}")]
    InvalidConfiguration(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("SMTP session failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("{0}")]
    Protocol(String),

    #[error("{context}: error_code={}, description={}", display_code(.code), .description.as_deref().unwrap_or("none"))]
    Application {
        context: String,
        code: Option<i64>,
        description: Option<String>,
    },

    #[error("channel panicked: {0}")]
    Panicked(String),
}

fn display_code(code: &Option<i64>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

impl NotifyError {
    /// A stable name for the failure class, used in status lines.
    pub fn kind(&self) -> &'static str {
        match self {
            NotifyError::ConfigurationMissing(_) => "ConfigurationMissing",
            NotifyError::InvalidConfiguration(_) => "ConfigurationInvalid",
            NotifyError::Transport(_) => "TransportFailure",
            NotifyError::Smtp(e) if e.is_permanent() || e.is_transient() => "ApplicationFailure",
            NotifyError::Smtp(_) => "TransportFailure",
            NotifyError::Protocol(_) => "ProtocolFailure",
            NotifyError::Application { .. } => "ApplicationFailure",
            NotifyError::Panicked(_) => "Panic",
        }
    }
}

/// Keeps at most `limit` characters of a response body for error messages.
pub(crate) fn truncate_body(body: &str, limit: usize) -> String {
    body.chars().take(limit).collect()
}
