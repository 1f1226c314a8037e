use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pricedb_core::{DocumentId, Money};
use pricedb_inventory::Item;

/// A persisted item document.
///
/// `tags`, `comments` and the timestamps are metadata carried by the
/// document store; the inventory logic never reads them, and price updates
/// leave everything except `price_cents` and `updated_at` untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDocument {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub item: String,
    #[serde(rename = "price_cents")]
    pub price: Money,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub comments: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ItemDocument {
    /// A fresh document with a new id and `created_at` set to `now`.
    pub fn new(item: impl Into<String>, price: Money, now: DateTime<Utc>) -> Self {
        Self {
            id: DocumentId::new(),
            item: item.into(),
            price,
            tags: Vec::new(),
            comments: 0,
            created_at: now,
            updated_at: None,
        }
    }

    pub fn to_item(&self) -> Item {
        Item {
            name: self.item.clone(),
            price: self.price,
        }
    }
}

/// Document selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Every document that carries an item name.
    All,
    /// Documents whose item name equals the given one.
    Item(String),
}

impl Filter {
    pub fn item(name: impl Into<String>) -> Self {
        Self::Item(name.into())
    }

    pub fn item_name(&self) -> Option<&str> {
        match self {
            Filter::All => None,
            Filter::Item(name) => Some(name),
        }
    }

    pub fn matches(&self, doc: &ItemDocument) -> bool {
        match self {
            Filter::All => true,
            Filter::Item(name) => doc.item == *name,
        }
    }
}

/// Partial update: set the price (and stamp `updated_at`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceUpdate {
    pub price: Money,
    pub updated_at: DateTime<Utc>,
}

impl PriceUpdate {
    pub fn new(price: Money, updated_at: DateTime<Utc>) -> Self {
        Self { price, updated_at }
    }

    pub fn apply(&self, doc: &mut ItemDocument) {
        doc.price = self.price;
        doc.updated_at = Some(self.updated_at);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    pub matched: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeleteOutcome {
    pub deleted: u64,
}

/// Backend failure reported by a collection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// Network, pool, or server-side failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// A stored document could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The collection handle was closed.
    #[error("collection closed")]
    Closed,
}

impl CollectionError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Whether repeating the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, CollectionError::Transport(_))
    }
}

/// A collection of item documents in a (possibly remote) document store.
///
/// ## Semantics
///
/// - `find_one` returns the first matching document, or `None`.
/// - `find_many` materializes every matching document.
/// - `update_one` / `delete_one` affect at most one matching document and
///   report how many matched / were removed.
/// - No uniqueness is enforced on `item`; callers that need it check first.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    async fn find_one(&self, filter: &Filter) -> Result<Option<ItemDocument>, CollectionError>;

    async fn find_many(&self, filter: &Filter) -> Result<Vec<ItemDocument>, CollectionError>;

    async fn insert_one(&self, doc: ItemDocument) -> Result<DocumentId, CollectionError>;

    async fn update_one(
        &self,
        filter: &Filter,
        update: PriceUpdate,
    ) -> Result<UpdateOutcome, CollectionError>;

    async fn delete_one(&self, filter: &Filter) -> Result<DeleteOutcome, CollectionError>;

    /// Release the underlying connection. Later calls may fail with `Closed`.
    async fn close(&self) {}
}

#[async_trait]
impl<S> DocumentCollection for Arc<S>
where
    S: DocumentCollection + ?Sized,
{
    async fn find_one(&self, filter: &Filter) -> Result<Option<ItemDocument>, CollectionError> {
        (**self).find_one(filter).await
    }

    async fn find_many(&self, filter: &Filter) -> Result<Vec<ItemDocument>, CollectionError> {
        (**self).find_many(filter).await
    }

    async fn insert_one(&self, doc: ItemDocument) -> Result<DocumentId, CollectionError> {
        (**self).insert_one(doc).await
    }

    async fn update_one(
        &self,
        filter: &Filter,
        update: PriceUpdate,
    ) -> Result<UpdateOutcome, CollectionError> {
        (**self).update_one(filter, update).await
    }

    async fn delete_one(&self, filter: &Filter) -> Result<DeleteOutcome, CollectionError> {
        (**self).delete_one(filter).await
    }

    async fn close(&self) {
        (**self).close().await
    }
}
