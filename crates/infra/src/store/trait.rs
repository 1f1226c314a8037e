use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use pricedb_core::Money;
use pricedb_inventory::Item;

use crate::collection::CollectionError;

pub type StoreResult<T> = Result<T, StoreError>;

/// Inventory store operation error.
///
/// `NotFound` and `AlreadyExists` are the expected outcomes of the CRUD state
/// machine; `Backend` and `Timeout` are infrastructure failures local to one
/// request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("no such item: {0:?}")]
    NotFound(String),

    #[error("item already exists: {0:?}")]
    AlreadyExists(String),

    #[error("{0}")]
    Backend(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl StoreError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    pub fn already_exists(name: impl Into<String>) -> Self {
        Self::AlreadyExists(name.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

impl From<CollectionError> for StoreError {
    fn from(err: CollectionError) -> Self {
        Self::Backend(err.to_string())
    }
}

/// CRUD over the item collection, keyed by item name.
///
/// ## Contract
///
/// - `create` fails with `AlreadyExists` if the name is present and leaves
///   the stored price unchanged.
/// - `update` and `delete` fail with `NotFound` if the name is absent; they
///   never create.
/// - `get` and `list` never create or delete.
/// - `list` returns a snapshot; ordering is unspecified.
/// - Backend failures are reported as `Backend`/`Timeout`, never as
///   `NotFound`.
///
/// Callers validate names and prices before calling; the store does not
/// re-check them.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn get(&self, name: &str) -> StoreResult<Item>;

    async fn list(&self) -> StoreResult<Vec<Item>>;

    async fn create(&self, name: &str, price: Money) -> StoreResult<()>;

    async fn update(&self, name: &str, price: Money) -> StoreResult<()>;

    async fn delete(&self, name: &str) -> StoreResult<()>;

    /// Release backend resources at process shutdown.
    async fn shutdown(&self) {}
}

#[async_trait]
impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    async fn get(&self, name: &str) -> StoreResult<Item> {
        (**self).get(name).await
    }

    async fn list(&self) -> StoreResult<Vec<Item>> {
        (**self).list().await
    }

    async fn create(&self, name: &str, price: Money) -> StoreResult<()> {
        (**self).create(name, price).await
    }

    async fn update(&self, name: &str, price: Money) -> StoreResult<()> {
        (**self).update(name, price).await
    }

    async fn delete(&self, name: &str) -> StoreResult<()> {
        (**self).delete(name).await
    }

    async fn shutdown(&self) {
        (**self).shutdown().await
    }
}
