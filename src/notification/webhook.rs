//! Channels that deliver with a single JSON POST to a push service or an
//! incoming-webhook URL.

use crate::config::Config;
use crate::core::Notification;
use crate::notification::{truncate_body, Channel, NotifyError};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

const BODY_PREVIEW_CHARS: usize = 200;

/// The push services reached through a plain JSON POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookKind {
    PushPlus,
    ServerChan,
    DingTalk,
    Feishu,
    WeCom,
}

impl WebhookKind {
    pub fn name(self) -> &'static str {
        match self {
            WebhookKind::PushPlus => "PushPlus",
            WebhookKind::ServerChan => "Server Push",
            WebhookKind::DingTalk => "DingTalk",
            WebhookKind::Feishu => "Feishu",
            WebhookKind::WeCom => "WeChat Work",
        }
    }

    fn missing_message(self) -> &'static str {
        match self {
            WebhookKind::PushPlus => "PushPlus Token not configured",
            WebhookKind::ServerChan => "Server Push key not configured",
            WebhookKind::DingTalk => "DingTalk Webhook not configured",
            WebhookKind::Feishu => "Feishu Webhook not configured",
            WebhookKind::WeCom => "WeChat Work Webhook not configured",
        }
    }

    /// The request body in the provider's expected shape.
    fn payload(self, credential: &str, notification: &Notification) -> Value {
        let Notification { title, content, .. } = notification;
        match self {
            WebhookKind::PushPlus => json!({
                "token": credential,
                "title": title,
                "content": content,
                "template": "html",
            }),
            WebhookKind::ServerChan => json!({ "title": title, "desp": content }),
            WebhookKind::DingTalk | WebhookKind::WeCom => json!({
                "msgtype": "text",
                "text": { "content": format!("{}\n{}", title, content) },
            }),
            WebhookKind::Feishu => json!({
                "msg_type": "interactive",
                "card": {
                    "elements": [
                        { "tag": "markdown", "content": content, "text_align": "left" }
                    ],
                    "header": {
                        "template": "blue",
                        "title": { "content": title, "tag": "plain_text" },
                    },
                },
            }),
        }
    }

    /// Status-code fields and the value each provider reports on success.
    fn ack_fields(self) -> &'static [(&'static str, i64)] {
        match self {
            WebhookKind::PushPlus => &[("code", 200)],
            WebhookKind::ServerChan => &[("code", 0)],
            WebhookKind::DingTalk | WebhookKind::WeCom => &[("errcode", 0)],
            WebhookKind::Feishu => &[("code", 0), ("StatusCode", 0)],
        }
    }

    /// Checks a 2xx response body for a provider-reported failure.
    ///
    /// Bodies that are not JSON, or carry no status-code field, are accepted.
    fn check_ack(self, body: &str) -> Result<(), NotifyError> {
        let Ok(payload) = serde_json::from_str::<Value>(body) else {
            return Ok(());
        };

        for (field, success) in self.ack_fields() {
            let Some(code) = payload.get(*field).and_then(Value::as_i64) else {
                continue;
            };
            if code != *success {
                let description = ["msg", "message", "errmsg", "StatusMessage"]
                    .iter()
                    .find_map(|key| payload.get(*key).and_then(Value::as_str))
                    .map(str::to_string);
                return Err(NotifyError::Application {
                    context: format!("{} API error", self.name()),
                    code: Some(code),
                    description,
                });
            }
        }
        Ok(())
    }
}

/// A push-service or webhook channel.
pub struct WebhookChannel {
    kind: WebhookKind,
    /// Token, send key, or full webhook URL, depending on the kind.
    credential: Option<String>,
    endpoint: String,
    client: reqwest::Client,
}

impl WebhookChannel {
    pub fn new(
        kind: WebhookKind,
        credential: Option<String>,
        endpoint: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            kind,
            credential,
            endpoint: endpoint.into(),
            client,
        }
    }

    /// Builds the channel of the given kind from the loaded configuration.
    pub fn from_config(kind: WebhookKind, config: &Config, client: reqwest::Client) -> Self {
        let (credential, endpoint) = match kind {
            WebhookKind::PushPlus => (
                config.pushplus.token.clone(),
                config.pushplus.endpoint.clone(),
            ),
            WebhookKind::ServerChan => (
                config.serverchan.send_key.clone(),
                config.serverchan.endpoint.clone(),
            ),
            WebhookKind::DingTalk => (config.dingtalk.webhook.clone(), String::new()),
            WebhookKind::Feishu => (config.feishu.webhook.clone(), String::new()),
            WebhookKind::WeCom => (config.wecom.webhook.clone(), String::new()),
        };
        Self::new(kind, credential, endpoint, client)
    }

    fn credential(&self) -> Result<&str, NotifyError> {
        self.credential
            .as_deref()
            .ok_or_else(|| NotifyError::ConfigurationMissing(self.kind.missing_message().into()))
    }

    fn url(&self, credential: &str) -> String {
        match self.kind {
            WebhookKind::PushPlus => self.endpoint.clone(),
            WebhookKind::ServerChan => {
                format!("{}/{}.send", self.endpoint.trim_end_matches('/'), credential)
            }
            WebhookKind::DingTalk | WebhookKind::Feishu | WebhookKind::WeCom => {
                credential.to_string()
            }
        }
    }
}

#[async_trait]
impl Channel for WebhookChannel {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn is_configured(&self) -> bool {
        self.credential.is_some()
    }

    #[instrument(skip_all, fields(channel = self.kind.name()))]
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let credential = self.credential()?;
        let payload = self.kind.payload(credential, notification);

        debug!("Posting notification to {}", self.kind.name());
        let response = self
            .client
            .post(self.url(credential))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(NotifyError::Protocol(format!(
                "{} HTTP {}. body={}",
                self.kind.name(),
                status.as_u16(),
                truncate_body(&body, BODY_PREVIEW_CHARS)
            )));
        }

        self.kind.check_ack(&body)?;
        info!("Successfully sent notification to {}.", self.kind.name());
        Ok(())
    }
}
