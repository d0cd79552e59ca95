//! User document.

use serde::{Deserialize, Serialize};

use crate::storage::{Chat, User};

/// A chat that has talked to the bot, keyed by `chat_id`.
///
/// `auth` is edited by hand in the database to let a chat log habits.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DbUser {
    pub chat_id: i64,
    pub name: String,
    #[serde(default)]
    pub auth: bool,
    /// Unix timestamp of first contact. Hand-written records may omit it.
    #[serde(default)]
    pub created_at: i64,
}

impl DbUser {
    /// Unauthorized record for a chat seen for the first time.
    pub fn first_contact(chat: &Chat) -> Self {
        Self {
            chat_id: chat.id,
            name: chat.name.clone(),
            auth: false,
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

impl From<DbUser> for User {
    fn from(user: DbUser) -> Self {
        Self {
            name: user.name,
            chat_id: user.chat_id,
            auth: user.auth,
        }
    }
}
