//! Daily report.
//!
//! The chat transport echoes this string verbatim, so the labels and the
//! placeholder text are part of what users see.

use std::sync::Arc;

use crate::storage::Storage;

use super::habits::Habit;

/// Shown under a habit with nothing logged today.
pub const NO_ITEMS_MESSAGE: &str = "No hay items";

/// Returned instead of a report for unauthorized chats.
pub const NO_REPORT_MESSAGE: &str = "";

/// Report access for one chat, gated on its authorization.
///
/// Cheap to clone, so reply handlers can hold one without borrowing the
/// tracker.
#[derive(Clone)]
pub struct Reporter {
    auth: bool,
    storage: Arc<dyn Storage>,
}

impl Reporter {
    pub(super) fn new(auth: bool, storage: Arc<dyn Storage>) -> Self {
        Self { auth, storage }
    }

    /// Today's report, or [`NO_REPORT_MESSAGE`] without touching storage for
    /// an unauthorized chat.
    pub async fn report(&self) -> anyhow::Result<String> {
        if !self.auth {
            return Ok(NO_REPORT_MESSAGE.to_string());
        }
        build_report(self.storage.as_ref()).await
    }
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter").field("auth", &self.auth).finish()
    }
}

/// Build today's report from `storage`.
pub async fn build_report(storage: &dyn Storage) -> anyhow::Result<String> {
    let mut sections = Vec::with_capacity(Habit::ALL.len());

    for habit in Habit::ALL {
        let items = storage.get_items_from_habit(habit.name()).await?;
        let body = if habit.is_counted() {
            format_count(items.len())
        } else {
            format_items(&items)
        };
        sections.push(format!("{}:\n  {}", habit.label(), body));
    }

    Ok(sections.join("\n"))
}

fn format_items(items: &[String]) -> String {
    if items.is_empty() {
        return NO_ITEMS_MESSAGE.to_string();
    }
    items.join("\n  ")
}

fn format_count(count: usize) -> String {
    let unit = if count == 1 { "vaso" } else { "vasos" };
    format!("{} {}", count, unit)
}
