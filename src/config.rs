//! Configuration management for multipush
//!
//! This module defines the main `Config` struct and its sub-structs. It uses
//! the `figment` crate to layer built-in defaults, an optional
//! `multipush.toml` file, the conventional provider environment variables,
//! `NOTIFY_`-prefixed overrides and finally command-line flags.

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    value::{Uncased, UncasedStr},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::formatting::TableMode;

/// The config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "multipush.toml";

/// Provider environment variables and the config keys they populate.
const PROVIDER_ENV_KEYS: &[(&str, &str)] = &[
    ("EMAIL_USER", "email.user"),
    ("EMAIL_PASS", "email.password"),
    ("EMAIL_TO", "email.to"),
    ("CUSTOM_SMTP_SERVER", "email.smtp_server"),
    ("PUSHPLUS_TOKEN", "pushplus.token"),
    ("SERVERPUSHKEY", "serverchan.send_key"),
    ("DINGDING_WEBHOOK", "dingtalk.webhook"),
    ("FEISHU_WEBHOOK", "feishu.webhook"),
    ("WEIXIN_WEBHOOK", "wecom.webhook"),
    ("TELEGRAM_BOT_TOKEN", "telegram.bot_token"),
    ("TELEGRAM_CHAT_ID", "telegram.chat_id"),
    ("TELEGRAM_FORMAT", "telegram.format"),
];

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// Append the full error trace to failed status lines.
    #[serde(deserialize_with = "lenient::flag")]
    pub debug: bool,
    /// Settings shared by every HTTP-based channel.
    pub http: HttpConfig,
    pub email: EmailConfig,
    pub pushplus: PushPlusConfig,
    pub serverchan: ServerChanConfig,
    pub dingtalk: WebhookConfig,
    pub feishu: WebhookConfig,
    pub wecom: WebhookConfig,
    pub telegram: TelegramConfig,
}

/// Settings shared by the HTTP channels.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct HttpConfig {
    /// Upper bound for a single request, in seconds.
    pub timeout_seconds: u64,
}

/// SMTP delivery settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EmailConfig {
    /// Sender address, also used as the SMTP login.
    #[serde(default, deserialize_with = "lenient::string")]
    pub user: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub password: Option<String>,
    /// Recipient address, or a comma-separated list of them.
    #[serde(default, deserialize_with = "lenient::string")]
    pub to: Option<String>,
    /// Explicit relay host; derived from the sender's domain when unset.
    #[serde(default, deserialize_with = "lenient::string")]
    pub smtp_server: Option<String>,
    /// Display name placed in the `From` header.
    pub sender_name: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PushPlusConfig {
    #[serde(default, deserialize_with = "lenient::string")]
    pub token: Option<String>,
    pub endpoint: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerChanConfig {
    #[serde(default, deserialize_with = "lenient::string")]
    pub send_key: Option<String>,
    /// Base URL; the send key is appended as `/<key>.send`.
    pub endpoint: String,
}

/// A channel addressed by a single incoming-webhook URL.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct WebhookConfig {
    #[serde(default, deserialize_with = "lenient::string")]
    pub webhook: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TelegramConfig {
    #[serde(default, deserialize_with = "lenient::string")]
    pub bot_token: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub chat_id: Option<String>,
    /// Body layout: `auto`, `table` or `plain`.
    pub format: TableMode,
    /// Bot API base URL.
    pub api_base: String,
}

impl Config {
    /// Loads the application configuration, layering every source in order.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let config = Self::figment(&config_path).merge(cli.clone()).extract()?;
        Ok(config)
    }

    /// The layered sources below the command line.
    pub fn figment(config_path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::raw().filter_map(provider_env_key))
            // e.g. NOTIFY_DEBUG=true, NOTIFY_HTTP__TIMEOUT_SECONDS=10
            .merge(Env::prefixed("NOTIFY_").split("__"))
    }
}

fn provider_env_key(key: &UncasedStr) -> Option<Uncased<'_>> {
    PROVIDER_ENV_KEYS
        .iter()
        .find(|(env, _)| key.as_str().eq_ignore_ascii_case(env))
        .map(|(_, path)| Uncased::from(*path))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            debug: false,
            http: HttpConfig {
                timeout_seconds: 30,
            },
            email: EmailConfig {
                user: None,
                password: None,
                to: None,
                smtp_server: None,
                sender_name: "AnyRouter Assistant".to_string(),
            },
            pushplus: PushPlusConfig {
                token: None,
                endpoint: "http://www.pushplus.plus/send".to_string(),
            },
            serverchan: ServerChanConfig {
                send_key: None,
                endpoint: "https://sctapi.ftqq.com".to_string(),
            },
            dingtalk: WebhookConfig::default(),
            feishu: WebhookConfig::default(),
            wecom: WebhookConfig::default(),
            telegram: TelegramConfig {
                bot_token: None,
                chat_id: None,
                format: TableMode::Auto,
                api_base: "https://api.telegram.org".to_string(),
            },
        }
    }
}

/// Deserializers that accept whatever shape an environment variable parses to.
///
/// Figment turns `TELEGRAM_CHAT_ID=-100123` into an integer and `true` into a
/// boolean; credentials must stay text regardless.
mod lenient {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Str(String),
        Int(i64),
        UInt(u64),
        Float(f64),
        Bool(bool),
    }

    impl Scalar {
        fn into_string(self) -> String {
            match self {
                Scalar::Str(s) => s,
                Scalar::Int(n) => n.to_string(),
                Scalar::UInt(n) => n.to_string(),
                Scalar::Float(n) => n.to_string(),
                Scalar::Bool(b) => b.to_string(),
            }
        }
    }

    /// An optional credential; empty or whitespace-only values mean unset.
    pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Scalar>::deserialize(deserializer)?;
        Ok(value
            .map(Scalar::into_string)
            .filter(|s| !s.trim().is_empty()))
    }

    /// A flag that is on only for a case-insensitive `true`.
    pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Scalar>::deserialize(deserializer)?;
        Ok(match value {
            Some(Scalar::Bool(b)) => b,
            Some(other) => other.into_string().trim().eq_ignore_ascii_case("true"),
            None => false,
        })
    }
}
