//! The fixed, ordered set of delivery channels.

use crate::config::Config;
use crate::notification::email::EmailChannel;
use crate::notification::telegram::TelegramChannel;
use crate::notification::webhook::{WebhookChannel, WebhookKind};
use crate::notification::{Channel, NotifyError};
use std::time::Duration;

/// Channels in delivery priority order.
pub struct ChannelRegistry {
    channels: Vec<Box<dyn Channel>>,
}

impl ChannelRegistry {
    /// Wraps an explicit channel list; order is preserved as given.
    pub fn new(channels: Vec<Box<dyn Channel>>) -> Self {
        Self { channels }
    }

    /// Builds every channel from configuration: Email, PushPlus, Server Push,
    /// DingTalk, Feishu, WeChat Work, Telegram.
    ///
    /// Missing credentials do not fail construction; the affected channel
    /// reports them when it is asked to send.
    pub fn from_config(config: &Config) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http.timeout_seconds))
            .build()?;

        let webhook = |kind: WebhookKind| -> Box<dyn Channel> {
            Box::new(WebhookChannel::from_config(kind, config, client.clone()))
        };

        let channels: Vec<Box<dyn Channel>> = vec![
            Box::new(EmailChannel::from_config(&config.email)),
            webhook(WebhookKind::PushPlus),
            webhook(WebhookKind::ServerChan),
            webhook(WebhookKind::DingTalk),
            webhook(WebhookKind::Feishu),
            webhook(WebhookKind::WeCom),
            Box::new(TelegramChannel::from_config(&config.telegram, client.clone())),
        ];
        Ok(Self::new(channels))
    }

    pub fn channels(&self) -> &[Box<dyn Channel>] {
        &self.channels
    }

    /// Names of the channels whose credentials are present.
    pub fn configured_names(&self) -> Vec<&str> {
        self.channels
            .iter()
            .filter(|c| c.is_configured())
            .map(|c| c.name())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
