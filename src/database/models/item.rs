//! Item document.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One logged item. `day` is the calendar date it counts towards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DbItem {
    pub habit: String,
    pub title: String,
    /// `YYYY-MM-DD` in the configured UTC offset.
    pub day: String,
    /// Unix timestamp in milliseconds, orders items within a day.
    pub created_at: i64,
}

impl DbItem {
    pub fn new(habit: &str, title: &str, now: DateTime<Utc>, utc_offset: FixedOffset) -> Self {
        Self {
            habit: habit.to_string(),
            title: title.to_string(),
            day: day_key(now, utc_offset),
            created_at: now.timestamp_millis(),
        }
    }
}

/// Calendar day of `now` as seen from `utc_offset`.
pub fn day_key(now: DateTime<Utc>, utc_offset: FixedOffset) -> String {
    let day: NaiveDate = now.with_timezone(&utc_offset).date_naive();
    day.format("%Y-%m-%d").to_string()
}
