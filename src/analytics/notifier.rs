//! Notification sinks
//!
//! Dispatch is best-effort: callers log the error and move on.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::config::{NotifyConfig, TelegramConfig};
use crate::error::EnrichmentError;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a formatted message
    async fn send(&self, text: &str) -> Result<(), EnrichmentError>;

    /// Name for logs
    fn name(&self) -> &'static str;
}

/// Pick the notifier the configuration asks for
pub fn from_config(config: &NotifyConfig) -> Result<Box<dyn Notifier>> {
    match &config.telegram {
        Some(telegram) => Ok(Box::new(TelegramNotifier::new(
            telegram,
            Duration::from_secs(config.timeout_secs.max(1)),
        )?)),
        None => Ok(Box::new(NoopNotifier)),
    }
}

/// Posts messages through the Telegram Bot API `sendMessage` method
pub struct TelegramNotifier {
    client: Client,
    endpoint: String,
    chat_id: String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("tracelink/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client for Telegram notifications")?;

        let endpoint = format!(
            "{}/bot{}/sendMessage",
            config.api_base.trim_end_matches('/'),
            config.bot_token
        );

        Ok(Self {
            client,
            endpoint,
            chat_id: config.chat_id.clone(),
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), EnrichmentError> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: "Markdown",
        };

        // The endpoint embeds the bot token; strip the URL from errors
        self.client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| EnrichmentError::notify(e.without_url()))?
            .error_for_status()
            .map_err(|e| EnrichmentError::notify(e.without_url()))?;

        Ok(())
    }

    fn name(&self) -> &'static str {
        "Telegram"
    }
}

/// Used when no bot is configured
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, text: &str) -> Result<(), EnrichmentError> {
        debug!(len = text.len(), "notifications disabled, dropping message");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}
