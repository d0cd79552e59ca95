//! Habitbot - Telegram habit logger
//!
//! Log what you eat and drink during the day with slash commands and get a
//! daily report back.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `tracker` - Command dispatch, authorization and events
//! - `storage` - Storage contract and in-memory backend
//! - `database` - MongoDB backend
//! - `cache` - Moka-based caching
//! - `bot` - Telegram transport (polling or webhook)
//! - `plugins` - Extra commands and replies

mod bot;
mod cache;
mod config;
mod database;
mod plugins;
mod storage;
mod tracker;

use std::sync::Arc;

use anyhow::Context;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{Config, StorageBackend};
use database::{Database, MongoStorage};
use plugins::Command;
use storage::{MemoryStorage, Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("habitbot=info,teloxide=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    info!("Starting habitbot...");

    let config = Config::from_env()?;
    info!("Configuration loaded successfully");
    info!("Bot mode: {:?}", config.bot_mode);

    let storage = connect_storage(&config).await?;

    let bot = Bot::new(&config.bot_token);
    let me = bot.get_me().await?;
    info!("Bot username: @{}", me.username());

    bot.set_my_commands(Command::bot_commands()).await?;
    info!("Command menu published");

    let dispatcher = bot::build_dispatcher(bot.clone(), storage);
    bot::run(&config, bot, dispatcher).await
}

/// Open the configured storage backend.
async fn connect_storage(config: &Config) -> anyhow::Result<Arc<dyn Storage>> {
    match config.storage_backend {
        StorageBackend::Mongodb => {
            let uri = config
                .mongodb_uri
                .as_deref()
                .context("MONGODB_URI must be set")?;

            info!("Connecting to MongoDB...");
            let db = Database::connect(uri, &config.mongodb_database).await?;
            let storage = MongoStorage::new(&db, config.utc_offset).await?;
            info!("Database connected");
            Ok(Arc::new(storage))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage, everything is lost on restart");
            if config.authorized_chats.is_empty() {
                warn!("AUTHORIZED_CHATS is empty, every chat will be rejected");
            } else {
                info!("Authorized chats: {:?}", config.authorized_chats);
            }
            Ok(Arc::new(MemoryStorage::with_authorized(
                config.authorized_chats.iter().copied(),
                config.utc_offset,
            )))
        }
    }
}
