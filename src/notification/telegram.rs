//! A client for sending notifications through the Telegram Bot API.

use crate::config::TelegramConfig;
use crate::core::Notification;
use crate::formatting::{TableMode, TelegramFormatter, TextFormatter};
use crate::notification::{truncate_body, Channel, NotifyError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info, instrument};

const BODY_PREVIEW_CHARS: usize = 200;

/// The fields of a Bot API reply that matter for delivery.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: Option<bool>,
    error_code: Option<i64>,
    description: Option<String>,
}

impl ApiResponse {
    fn detail(&self) -> String {
        format!(
            "error_code={}, description={}",
            self.error_code
                .map_or_else(|| "none".to_string(), |c| c.to_string()),
            self.description.as_deref().unwrap_or("none")
        )
    }
}

/// Sends HTML-formatted messages to a single chat.
pub struct TelegramChannel {
    bot_token: Option<String>,
    chat_id: Option<String>,
    api_base: String,
    formatter: Box<dyn TextFormatter>,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(
        bot_token: Option<String>,
        chat_id: Option<String>,
        api_base: impl Into<String>,
        mode: TableMode,
        client: reqwest::Client,
    ) -> Self {
        Self {
            bot_token,
            chat_id,
            api_base: api_base.into(),
            formatter: Box::new(TelegramFormatter::new(mode)),
            client,
        }
    }

    pub fn from_config(config: &TelegramConfig, client: reqwest::Client) -> Self {
        Self::new(
            config.bot_token.clone(),
            config.chat_id.clone(),
            config.api_base.clone(),
            config.format,
            client,
        )
    }

    fn credentials(&self) -> Result<(&str, &str), NotifyError> {
        match (self.bot_token.as_deref(), self.chat_id.as_deref()) {
            (Some(token), Some(chat_id)) => Ok((token, chat_id)),
            _ => Err(NotifyError::ConfigurationMissing(
                "Telegram Bot Token or Chat ID not configured".into(),
            )),
        }
    }

    fn send_message_url(&self, token: &str) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            token
        )
    }

    /// Interprets a Bot API reply. A success status is not enough: the body
    /// must parse and must not say `"ok": false`.
    fn check_response(status: reqwest::StatusCode, body: &str) -> Result<(), NotifyError> {
        if !status.is_success() {
            let detail = match serde_json::from_str::<ApiResponse>(body) {
                Ok(payload) => payload.detail(),
                Err(_) => format!("body={}", truncate_body(body, BODY_PREVIEW_CHARS)),
            };
            return Err(NotifyError::Protocol(format!(
                "Telegram HTTP {}. {}",
                status.as_u16(),
                detail
            )));
        }

        let payload: ApiResponse = serde_json::from_str(body).map_err(|_| {
            NotifyError::Protocol(format!(
                "Telegram invalid JSON response: {}",
                truncate_body(body, BODY_PREVIEW_CHARS)
            ))
        })?;

        if payload.ok == Some(false) {
            return Err(NotifyError::Application {
                context: "Telegram API error".into(),
                code: payload.error_code,
                description: payload.description,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "Telegram"
    }

    fn is_configured(&self) -> bool {
        self.credentials().is_ok()
    }

    #[instrument(skip_all, fields(channel = "Telegram"))]
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let (token, chat_id) = self.credentials()?;

        let text = self
            .formatter
            .format(&notification.title, &notification.content);
        let payload = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
        });

        debug!(chars = text.chars().count(), "Sending Telegram message");
        let response = self
            .client
            .post(self.send_message_url(token))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if let Err(e) = Self::check_response(status, &body) {
            error!(status = %status, error = %e, "Telegram rejected the message");
            return Err(e);
        }

        info!("Successfully sent notification to Telegram.");
        Ok(())
    }
}
