//! In-memory storage.
//!
//! Backs the test suite and `STORAGE_BACKEND=memory`. Items are kept per
//! calendar day; users are created unauthorized on first contact unless their
//! chat id was marked as authorized up front.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use dashmap::DashMap;
use tracing::debug;

use super::{Chat, Storage, User};

/// Chat with an authorized user record.
pub const KNOWN_CHAT: Chat = Chat {
    id: 0,
    name: String::new(),
};

/// Chat that has never been seen.
#[allow(dead_code)]
pub const UNKNOWN_CHAT: Chat = Chat {
    id: 1,
    name: String::new(),
};

/// Chat with a user record that is not authorized.
pub const UNAUTH_CHAT: Chat = Chat {
    id: 2,
    name: String::new(),
};

/// Storage that lives for the duration of the process.
#[derive(Debug)]
pub struct MemoryStorage {
    items: DashMap<(NaiveDate, String), Vec<String>>,
    users: DashMap<i64, User>,
    authorized: HashSet<i64>,
    utc_offset: FixedOffset,
}

impl MemoryStorage {
    /// Storage seeded with the [`KNOWN_CHAT`] and [`UNAUTH_CHAT`] fixtures.
    pub fn new() -> Self {
        let storage = Self::with_authorized([KNOWN_CHAT.id], Utc.fix());
        storage.users.insert(UNAUTH_CHAT.id, User::unauthorized(&UNAUTH_CHAT));
        storage
    }

    /// Empty storage where `chat_ids` are authorized.
    pub fn with_authorized(chat_ids: impl IntoIterator<Item = i64>, utc_offset: FixedOffset) -> Self {
        Self {
            items: DashMap::new(),
            users: DashMap::new(),
            authorized: chat_ids.into_iter().collect(),
            utc_offset,
        }
    }

    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.utc_offset).date_naive()
    }

    /// Append `item` under `day`, dropping every earlier day.
    fn push_item(&self, day: NaiveDate, habit: &str, item: &str) {
        self.items.retain(|(item_day, _), _| *item_day >= day);
        self.items
            .entry((day, habit.to_string()))
            .or_default()
            .push(item.to_string());
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_items_from_habit(&self, habit: &str) -> anyhow::Result<Vec<String>> {
        let key = (self.today(), habit.to_string());
        Ok(self.items.get(&key).map(|items| items.value().clone()).unwrap_or_default())
    }

    async fn add_item_to_habit(&self, habit: &str, item: &str) -> anyhow::Result<()> {
        self.push_item(self.today(), habit, item);
        Ok(())
    }

    async fn get_user_by_chat(&self, chat: &Chat) -> anyhow::Result<Option<User>> {
        if let Some(user) = self.users.get(&chat.id) {
            return Ok(Some(user.clone()));
        }

        let mut user = User::unauthorized(chat);
        user.auth = self.authorized.contains(&chat.id);
        self.users.insert(chat.id, user.clone());

        if user.auth {
            return Ok(Some(user));
        }

        // First contact from an unknown chat: remembered, but absent this time.
        debug!("First contact from chat {}", chat.id);
        Ok(None)
    }
}
