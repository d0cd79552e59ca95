//! /reporte command plugin.
//!
//! Sends today's report verbatim.

use teloxide::prelude::*;

use crate::tracker::{HabitTracker, Reporter};

pub const TOKEN: &str = "/reporte";

/// Register the /reporte handler.
pub fn install(tracker: &mut HabitTracker, bot: Bot, chat_id: ChatId) {
    let reporter = tracker.reporter();
    tracker.on_command(TOKEN, move |_| {
        let bot = bot.clone();
        let reporter = reporter.clone();
        async move { send_report(&bot, chat_id, &reporter).await }
    });
}

/// Build today's report and send it to `chat_id`. An empty report sends
/// nothing.
pub async fn send_report(bot: &Bot, chat_id: ChatId, reporter: &Reporter) -> anyhow::Result<()> {
    let report = reporter.report().await?;
    if report.is_empty() {
        return Ok(());
    }
    bot.send_message(chat_id, report).await?;
    Ok(())
}
