//! Replies to tracker events.
//!
//! The tracker only says what happened; this plugin decides what the chat
//! is told about it.

use teloxide::prelude::*;

use crate::tracker::{Habit, HabitTracker};

use super::report::send_report;

pub const UNAUTHORIZED: &str = "No estás autorizado a usar el bot";

pub const USAGE: &str = "Ingresá un comando del menú con el item a agregar.
Por ejemplo, \"/desayuno café\"";

/// Confirmation sent after an item is stored.
pub fn item_added(habit: Habit, item: &str) -> String {
    format!("{} agregado a {}", item, habit.name())
}

/// Subscribe the reply senders to `tracker`'s events.
pub fn install(tracker: &HabitTracker, bot: Bot, chat_id: ChatId) {
    let reporter = tracker.reporter();
    {
        let bot = bot.clone();
        tracker.on_item_added(move |habit, item| {
            let bot = bot.clone();
            let reporter = reporter.clone();
            async move {
                bot.send_message(chat_id, item_added(habit, &item)).await?;
                send_report(&bot, chat_id, &reporter).await
            }
        });
    }

    {
        let bot = bot.clone();
        tracker.on_chat_unknown(move || {
            let bot = bot.clone();
            async move {
                bot.send_message(chat_id, UNAUTHORIZED).await?;
                bot.send_message(chat_id, USAGE).await?;
                Ok(())
            }
        });
    }

    {
        let bot = bot.clone();
        tracker.on_command_unknown(move || send_usage(bot.clone(), chat_id));
    }

    tracker.on_command_error(move || send_usage(bot.clone(), chat_id));
}

async fn send_usage(bot: Bot, chat_id: ChatId) -> anyhow::Result<()> {
    bot.send_message(chat_id, USAGE).await?;
    Ok(())
}
