//! /start command plugin.
//!
//! Greets whoever opens the chat.

use teloxide::prelude::*;

use crate::tracker::HabitTracker;

pub const TOKEN: &str = "/start";

pub const GREETING: &str = "hola";

/// Register the /start handler.
pub fn install(tracker: &mut HabitTracker, bot: Bot, chat_id: ChatId) {
    tracker.on_command(TOKEN, move |_| {
        let bot = bot.clone();
        async move {
            bot.send_message(chat_id, GREETING).await?;
            Ok(())
        }
    });
}
