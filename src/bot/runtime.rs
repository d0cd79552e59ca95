//! Bot runtime - Polling and Webhook runners.

use std::net::SocketAddr;

use anyhow::Context;
use axum::routing::get;
use teloxide::dispatching::DefaultKey;
use teloxide::prelude::*;
use teloxide::update_listeners::UpdateListener;
use teloxide::update_listeners::webhooks::{self, Options};
use tracing::{error, info};
use url::Url;

use crate::config::{BotMode, Config};

/// Run the bot with the configured mode.
pub async fn run(
    config: &Config,
    bot: Bot,
    mut dispatcher: Dispatcher<Bot, anyhow::Error, DefaultKey>,
) -> anyhow::Result<()> {
    match config.bot_mode {
        BotMode::Polling => {
            info!("Starting bot in polling mode...");
            dispatcher.dispatch().await;
        }
        BotMode::Webhook => {
            info!("Starting bot in webhook mode...");
            run_webhook(config, bot, dispatcher).await?;
        }
    }
    Ok(())
}

/// Run the bot behind a webhook.
///
/// Telegram is told about the webhook on start and it is deleted again on
/// shutdown. Updates whose secret-token header doesn't match
/// `WEBHOOK_SECRET` are refused before they reach the dispatcher.
async fn run_webhook(
    config: &Config,
    bot: Bot,
    mut dispatcher: Dispatcher<Bot, anyhow::Error, DefaultKey>,
) -> anyhow::Result<()> {
    let webhook_url = config
        .webhook_url
        .as_deref()
        .context("WEBHOOK_URL must be set when using webhook mode")?;
    let url = Url::parse(webhook_url).context("Invalid WEBHOOK_URL format")?;

    // Listen on all interfaces at the configured port
    let address = SocketAddr::from(([0, 0, 0, 0], config.webhook_port));

    let secret = config
        .webhook_secret
        .clone()
        .context("WEBHOOK_SECRET must be set when using webhook mode")?;
    let options = Options::new(address, url.clone()).secret_token(secret);

    info!("Setting webhook URL: {}", url);
    let (mut listener, stop_flag, router) = webhooks::axum_to_router(bot, options)
        .await
        .context("Failed to setup webhook")?;

    let app = router.route("/health", get(health));
    let tcp = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on: {}", address);

    let stop_token = listener.stop_token();
    tokio::spawn(async move {
        if let Err(e) = axum::serve(tcp, app).with_graceful_shutdown(stop_flag).await {
            error!("Webhook server error: {}", e);
            stop_token.stop();
        }
    });

    let error_handler = LoggingErrorHandler::with_custom_text("Error from update listener");
    dispatcher
        .dispatch_with_listener(listener, error_handler)
        .await;

    Ok(())
}

async fn health() -> &'static str {
    "ok"
}
