//! User repository with cache-first lookups.
//!
//! Every incoming message resolves its chat here, so lookups go through a
//! short-lived cache keyed by chat id.

use anyhow::{Context, Result};
use mongodb::bson::{doc, Document};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use mongodb::Collection;
use tracing::info;

use crate::cache::{CacheConfig, TypedCache};
use crate::storage::Chat;
use super::models::DbUser;
use super::Database;

/// Repository for user records.
#[derive(Clone)]
pub struct UserRepo {
    collection: Collection<DbUser>,
    cache_by_chat: TypedCache<i64, DbUser>,
}

impl UserRepo {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("users"),
            cache_by_chat: TypedCache::new("users_by_chat", CacheConfig::user_records()),
        }
    }

    /// Get the user for a chat id.
    pub async fn get_by_chat_id(&self, chat_id: i64) -> Result<Option<DbUser>> {
        if let Some(user) = self.cache_by_chat.get(&chat_id) {
            return Ok(Some(user));
        }

        let filter = doc! { "chat_id": chat_id };
        let result = self.collection.find_one(filter).await?;

        if let Some(user) = &result {
            self.cache_by_chat.insert(chat_id, user.clone());
        }

        Ok(result)
    }

    /// Get the user for `chat`, recording an unauthorized one on first contact.
    pub async fn get_or_create(&self, chat: &Chat) -> Result<DbUser> {
        if let Some(user) = self.get_by_chat_id(chat.id).await? {
            return Ok(user);
        }

        // Insert-only upsert: racing first messages leave one record, and
        // whichever one loses reads back the winner's document.
        let (filter, update, options) = first_contact_upsert(chat)?;
        let user = self
            .collection
            .find_one_and_update(filter, update)
            .with_options(options)
            .await?
            .context("upsert returned no user document")?;

        self.cache_by_chat.insert(chat.id, user.clone());
        info!("Recorded new chat {} ({})", chat.id, chat.name);
        Ok(user)
    }
}

/// Filter, update and options that create `chat`'s record only if it is
/// missing and return the stored document either way.
fn first_contact_upsert(chat: &Chat) -> Result<(Document, Document, FindOneAndUpdateOptions)> {
    let filter = doc! { "chat_id": chat.id };
    let update = doc! { "$setOnInsert": mongodb::bson::to_document(&DbUser::first_contact(chat))? };
    let options = FindOneAndUpdateOptions::builder()
        .upsert(true)
        .return_document(ReturnDocument::After)
        .build();
    Ok((filter, update, options))
}
