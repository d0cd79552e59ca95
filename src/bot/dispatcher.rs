//! Message dispatcher setup.
//!
//! Every text message gets its own [`HabitTracker`], authorized for the chat
//! that sent it, with the reply plugins subscribed to its events.

use std::sync::Arc;

use teloxide::dispatching::{DefaultKey, UpdateHandler};
use teloxide::prelude::*;
use tracing::debug;

use crate::plugins;
use crate::storage::{Chat, Storage};
use crate::tracker::HabitTracker;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Item store and user directory.
    pub storage: Arc<dyn Storage>,
}

/// Build the dispatcher with the message handler.
pub fn build_dispatcher(
    bot: Bot,
    storage: Arc<dyn Storage>,
) -> Dispatcher<Bot, anyhow::Error, DefaultKey> {
    let state = AppState { storage };

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
}

/// Build the handler schema.
fn schema() -> UpdateHandler<anyhow::Error> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some())
        .endpoint(handle_message)
}

/// Run one text message through a tracker for its chat.
async fn handle_message(bot: Bot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let chat = chat_identity(&msg.chat);
    let mut tracker = HabitTracker::for_chat(&chat, state.storage.clone()).await;
    plugins::install(&mut tracker, bot, msg.chat.id);

    let handled = tracker.accept(text).await;
    debug!(
        chat_id = chat.id,
        authorized = tracker.is_authorized(),
        handled,
        "Message processed"
    );

    Ok(())
}

/// Identity the tracker sees for a Telegram chat.
fn chat_identity(chat: &teloxide::types::Chat) -> Chat {
    let name = match chat.title() {
        Some(title) => title.to_string(),
        None => format!(
            "{} {}",
            chat.first_name().unwrap_or_default(),
            chat.last_name().unwrap_or_default()
        )
        .trim()
        .to_string(),
    };
    Chat::new(chat.id.0, name)
}
