//! MongoDB-backed [`Storage`].

use async_trait::async_trait;
use chrono::{FixedOffset, Utc};

use crate::storage::{Chat, Storage, User};
use super::items::ItemRepository;
use super::models::{item::day_key, DbItem};
use super::users::UserRepo;
use super::Database;

/// Production storage: `users` and `items` collections.
#[derive(Clone)]
pub struct MongoStorage {
    users: UserRepo,
    items: ItemRepository,
    utc_offset: FixedOffset,
}

impl MongoStorage {
    /// Build the storage and make sure the item indexes exist.
    pub async fn new(db: &Database, utc_offset: FixedOffset) -> anyhow::Result<Self> {
        let items = ItemRepository::new(db);
        items.ensure_indexes().await?;

        Ok(Self {
            users: UserRepo::new(db),
            items,
            utc_offset,
        })
    }
}

#[async_trait]
impl Storage for MongoStorage {
    async fn get_items_from_habit(&self, habit: &str) -> anyhow::Result<Vec<String>> {
        let day = day_key(Utc::now(), self.utc_offset);
        self.items.titles(habit, &day).await
    }

    async fn add_item_to_habit(&self, habit: &str, item: &str) -> anyhow::Result<()> {
        let item = DbItem::new(habit, item, Utc::now(), self.utc_offset);
        self.items.insert(&item).await
    }

    async fn get_user_by_chat(&self, chat: &Chat) -> anyhow::Result<Option<User>> {
        let user = self.users.get_or_create(chat).await?;
        Ok(Some(user.into()))
    }
}
