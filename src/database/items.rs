//! Item repository.
//!
//! Items are partitioned by habit and calendar day. Reads are not cached:
//! the report must reflect an item the moment it is added.

use anyhow::Result;
use futures::StreamExt;
use mongodb::bson::{doc, Document};
use mongodb::{Collection, IndexModel};
use tracing::debug;

use super::models::DbItem;
use super::Database;

/// Repository for logged items.
#[derive(Clone)]
pub struct ItemRepository {
    collection: Collection<DbItem>,
}

impl ItemRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("items"),
        }
    }

    /// Create the `(habit, day)` index used by every read.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "habit": 1, "day": 1, "created_at": 1 })
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }

    /// Titles logged for `habit` on `day`, oldest first.
    pub async fn titles(&self, habit: &str, day: &str) -> Result<Vec<String>> {
        let raw_coll: Collection<Document> = self.collection.clone_with_type();
        let filter = doc! { "habit": habit, "day": day };
        let options = mongodb::options::FindOptions::builder()
            .projection(doc! { "title": 1, "_id": 0 })
            .sort(doc! { "created_at": 1 })
            .build();

        let mut cursor = raw_coll.find(filter).with_options(options).await?;
        let mut titles = Vec::new();

        while let Some(result) = cursor.next().await {
            let doc = result?;
            titles.push(doc.get_str("title")?.to_string());
        }

        debug!("Loaded {} items for {} on {}", titles.len(), habit, day);
        Ok(titles)
    }

    pub async fn insert(&self, item: &DbItem) -> Result<()> {
        self.collection.insert_one(item).await?;
        debug!("Inserted item '{}' into {}", item.title, item.habit);
        Ok(())
    }
}
