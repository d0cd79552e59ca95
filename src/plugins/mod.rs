//! Transport-side plugins.
//!
//! Each plugin hooks into a [`HabitTracker`] built for one message: extra
//! commands (`start`, `report`) register handlers, and `replies` turns the
//! tracker's events into messages back to the chat.
//!
//! Add new plugins by:
//! 1. Creating a new file in this directory
//! 2. Adding `pub mod your_plugin;` below
//! 3. Hooking it up in `install()`

pub mod replies;
pub mod report;
pub mod start;

use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::tracker::HabitTracker;

/// All bot commands, as shown in the Telegram menu.
///
/// Matching is done by the tracker on raw text; this enum only feeds
/// `set_my_commands`.
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "snake_case", description = "Comandos disponibles:")]
pub enum Command {
    #[command(description = "Agregar item al desayuno")]
    Desayuno,

    #[command(description = "Agregar item a media mañana")]
    MediaManiana,

    #[command(description = "Agregar item al almuerzo")]
    Almuerzo,

    #[command(description = "Agregar item a la merienda")]
    Merienda,

    #[command(description = "Agregar item a la cena")]
    Cena,

    #[command(description = "Sumar un vaso de agua")]
    Agua,

    #[command(description = "Ver el reporte del día")]
    Reporte,

    #[command(description = "Saludar al bot")]
    Start,
}

/// Register every plugin on `tracker`, replying to `chat_id`.
pub fn install(tracker: &mut HabitTracker, bot: Bot, chat_id: ChatId) {
    start::install(tracker, bot.clone(), chat_id);
    report::install(tracker, bot.clone(), chat_id);
    replies::install(tracker, bot, chat_id);
}
