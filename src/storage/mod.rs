//! Storage contract consumed by the tracker.
//!
//! The tracker only needs three operations; `database::MongoStorage` is the
//! production backend and [`MemoryStorage`] backs tests and local runs.

mod memory;

use async_trait::async_trait;

pub use memory::MemoryStorage;
#[cfg(test)]
pub use memory::{KNOWN_CHAT, UNAUTH_CHAT, UNKNOWN_CHAT};

/// Identity presented by the transport for an incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chat {
    pub id: i64,
    pub name: String,
}

impl Chat {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Persisted identity and authorization of a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub name: String,
    pub chat_id: i64,
    /// Only ever flipped out of band.
    pub auth: bool,
}

impl User {
    /// Record created on first contact; starts unauthorized.
    pub fn unauthorized(chat: &Chat) -> Self {
        Self {
            name: chat.name.clone(),
            chat_id: chat.id,
            auth: false,
        }
    }
}

/// Item store and user directory.
///
/// Every call may fail; the tracker reports failures as command errors.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Items logged today for `habit`, oldest first.
    async fn get_items_from_habit(&self, habit: &str) -> anyhow::Result<Vec<String>>;

    /// Append `item` to today's list for `habit`.
    async fn add_item_to_habit(&self, habit: &str, item: &str) -> anyhow::Result<()>;

    /// User record for `chat`, if any.
    async fn get_user_by_chat(&self, chat: &Chat) -> anyhow::Result<Option<User>>;
}
