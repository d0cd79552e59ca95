//! Configuration module for the habit bot.
//!
//! Loads configuration from environment variables.

use std::env;

use anyhow::{Context, bail};
use chrono::FixedOffset;
use serde::Deserialize;

/// Bot running mode
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BotMode {
    #[default]
    Polling,
    Webhook,
}

/// Where habits and users are stored
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Mongodb,
    /// Process-local, lost on restart. For trying the bot out.
    Memory,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub bot_token: String,
    pub bot_mode: BotMode,
    pub webhook_url: Option<String>,
    pub webhook_port: u16,

    /// Checked by Telegram against the `X-Telegram-Bot-Api-Secret-Token`
    /// header of every webhook call.
    pub webhook_secret: Option<String>,

    // Storage
    pub storage_backend: StorageBackend,
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,

    /// Chats allowed to log habits with the memory backend.
    pub authorized_chats: Vec<i64>,

    /// Offset used to decide which calendar day an item belongs to.
    pub utc_offset: FixedOffset,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    /// Returns error if a required variable is missing or malformed.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let bot_mode = match var("BOT_MODE")
            .unwrap_or_else(|| "polling".to_string())
            .to_lowercase()
            .as_str()
        {
            "webhook" => BotMode::Webhook,
            _ => BotMode::Polling,
        };

        let webhook_url = var("WEBHOOK_URL").filter(|s| !s.is_empty());
        if bot_mode == BotMode::Webhook && webhook_url.is_none() {
            bail!("WEBHOOK_URL must be set when BOT_MODE is webhook");
        }

        // Telegram's secret-token header is the only origin check on the webhook
        let webhook_secret = var("WEBHOOK_SECRET").filter(|s| !s.is_empty());
        if bot_mode == BotMode::Webhook && webhook_secret.is_none() {
            bail!("WEBHOOK_SECRET must be set when BOT_MODE is webhook");
        }

        let webhook_port = match var("WEBHOOK_PORT") {
            Some(port) => port.trim().parse().context("WEBHOOK_PORT must be a port number")?,
            None => 8080,
        };

        let storage_backend = match var("STORAGE_BACKEND")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "memory" => StorageBackend::Memory,
            _ => StorageBackend::Mongodb,
        };

        let mongodb_uri = var("MONGODB_URI").filter(|s| !s.is_empty());
        if storage_backend == StorageBackend::Mongodb && mongodb_uri.is_none() {
            bail!("MONGODB_URI must be set when STORAGE_BACKEND is mongodb");
        }

        // Parse authorized chat ids, skipping anything that isn't a number
        let authorized_chats = var("AUTHORIZED_CHATS")
            .unwrap_or_default()
            .split(',')
            .filter_map(|s| s.trim().parse::<i64>().ok())
            .collect();

        let offset_hours: i32 = match var("UTC_OFFSET_HOURS") {
            Some(hours) => hours.trim().parse().context("UTC_OFFSET_HOURS must be an integer")?,
            None => 0,
        };
        let utc_offset = FixedOffset::east_opt(offset_hours * 3600)
            .context("UTC_OFFSET_HOURS out of range")?;

        Ok(Self {
            bot_token: var("BOT_TOKEN").context("BOT_TOKEN must be set")?,
            bot_mode,
            webhook_url,
            webhook_port,
            webhook_secret,
            storage_backend,
            mongodb_uri,
            mongodb_database: var("MONGODB_DATABASE").unwrap_or_else(|| "habitbot".to_string()),
            authorized_chats,
            utc_offset,
        })
    }
}
