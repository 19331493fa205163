//! multipush - send one notification over every configured channel.
//!
//! A thin driver around the library: load configuration, read the body,
//! dispatch once and report. Delivery failures are printed, never fatal.

use anyhow::{Context, Result};
use clap::Parser;
use multipush::{cli::Cli, config::Config, ChannelRegistry, Dispatcher};
use std::io::Read;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = Config::load(&cli).unwrap_or_else(|err| {
        // Manually initialize logging for this specific error
        init_tracing("info");
        error!("Failed to load configuration: {}", err);
        std::process::exit(1);
    });

    init_tracing(&config.log_level);

    let content = read_content(&cli)?;
    let registry = ChannelRegistry::from_config(&config)
        .context("Failed to initialize delivery channels")?;

    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Debug Traces: {}", config.debug);
    info!("HTTP Timeout: {}s", config.http.timeout_seconds);
    info!("Telegram Format: {}", config.telegram.format);
    info!("Body Format: {}", cli.format);
    let enabled = registry.configured_names();
    info!(
        "Enabled Channels ({}/{}): {}",
        enabled.len(),
        registry.len(),
        if enabled.is_empty() {
            "none".to_string()
        } else {
            enabled.join(", ")
        }
    );
    info!("-------------------------------------------------------");

    let dispatcher = Dispatcher::new(registry, config.debug);
    let outcomes = dispatcher.push(&cli.title, &content, cli.format).await;

    let delivered = outcomes.iter().filter(|o| o.succeeded).count();
    info!(
        "Delivered over {} of {} channels.",
        delivered,
        outcomes.len()
    );

    Ok(())
}

/// Logs go to stderr so stdout carries only the per-channel status lines.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_content(cli: &Cli) -> Result<String> {
    if let Some(content) = &cli.content {
        return Ok(content.clone());
    }
    if let Some(path) = &cli.content_file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read content file {}", path.display()));
    }

    let mut content = String::new();
    std::io::stdin()
        .read_to_string(&mut content)
        .context("Failed to read content from stdin")?;
    Ok(content)
}
