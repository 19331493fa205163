//! Core domain types for multipush
//!
//! This module defines the notification handed to every channel and the
//! per-channel delivery outcome produced by the dispatcher.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The body format requested by the caller.
///
/// Only the email channel distinguishes between the two; every other channel
/// forwards the body as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatHint {
    #[default]
    Text,
    Html,
}

impl fmt::Display for FormatHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatHint::Text => write!(f, "text"),
            FormatHint::Html => write!(f, "html"),
        }
    }
}

impl FromStr for FormatHint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(FormatHint::Text),
            "html" => Ok(FormatHint::Html),
            other => Err(format!("unknown format hint '{}', expected text or html", other)),
        }
    }
}

/// A single notification, shared read-only by every channel attempt.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Notification {
    pub title: String,
    pub content: String,
    pub format: FormatHint,
}

impl Notification {
    pub fn new(title: impl Into<String>, content: impl Into<String>, format: FormatHint) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            format,
        }
    }
}

/// The result of attempting delivery over one channel.
///
/// Its `Display` form is the status line reported for that channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub channel_name: String,
    pub succeeded: bool,
    /// `<KindName>: <message>` for failed deliveries.
    pub error_message: Option<String>,
}

impl DeliveryOutcome {
    pub fn success(channel_name: impl Into<String>) -> Self {
        Self {
            channel_name: channel_name.into(),
            succeeded: true,
            error_message: None,
        }
    }

    pub fn failure(channel_name: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            channel_name: channel_name.into(),
            succeeded: false,
            error_message: Some(error_message.into()),
        }
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.succeeded {
            write!(f, "[{}]: Message push successful!", self.channel_name)
        } else {
            write!(
                f,
                "[{}]: Message push failed! Reason: {}",
                self.channel_name,
                self.error_message.as_deref().unwrap_or("unknown error")
            )
        }
    }
}
