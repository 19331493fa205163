//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using the
//! `clap` crate. The flags that override settings are merged on top of the
//! configuration file and environment variables through figment's `Provider`.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

use crate::core::FormatHint;

/// Send one notification over every configured channel.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Notification title.
    pub title: String,

    /// Notification body. Read from `--content-file` or stdin when omitted.
    pub content: Option<String>,

    /// Read the notification body from this file.
    #[arg(long, value_name = "FILE", conflicts_with = "content")]
    pub content_file: Option<PathBuf>,

    /// Body format passed to channels that distinguish it (text or html).
    #[arg(long, value_name = "FORMAT", default_value_t = FormatHint::Text)]
    pub format: FormatHint,

    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Append the full error trace to failed status lines.
    #[arg(long)]
    pub debug: bool,

    /// Telegram body layout (auto, table or plain).
    #[arg(long, value_name = "MODE")]
    pub telegram_format: Option<String>,

    /// Log level filter used when RUST_LOG is not set.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        // Only an explicit --debug overrides; absence leaves lower layers alone.
        if self.debug {
            dict.insert("debug".into(), Value::from(true));
        }

        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }

        if let Some(mode) = &self.telegram_format {
            let mut telegram = Dict::new();
            telegram.insert("format".into(), Value::from(mode.clone()));
            dict.insert("telegram".into(), Value::from(telegram));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
