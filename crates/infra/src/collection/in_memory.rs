use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use pricedb_core::DocumentId;

use super::r#trait::{
    CollectionError, DeleteOutcome, DocumentCollection, Filter, ItemDocument, PriceUpdate,
    UpdateOutcome,
};

/// In-memory document collection.
///
/// Intended for tests/dev. Documents are kept in insertion order; like a
/// real document store it does not enforce uniqueness of `item`.
#[derive(Debug, Default)]
pub struct InMemoryCollection {
    docs: RwLock<Vec<ItemDocument>>,
    closed: AtomicBool,
}

impl InMemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored document.
    pub fn documents(&self) -> Vec<ItemDocument> {
        self.docs.read().map(|d| d.clone()).unwrap_or_default()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<(), CollectionError> {
        if self.is_closed() {
            return Err(CollectionError::Closed);
        }
        Ok(())
    }
}

fn poisoned() -> CollectionError {
    CollectionError::transport("lock poisoned")
}

#[async_trait]
impl DocumentCollection for InMemoryCollection {
    async fn find_one(&self, filter: &Filter) -> Result<Option<ItemDocument>, CollectionError> {
        self.ensure_open()?;
        let docs = self.docs.read().map_err(|_| poisoned())?;
        Ok(docs.iter().find(|d| filter.matches(d)).cloned())
    }

    async fn find_many(&self, filter: &Filter) -> Result<Vec<ItemDocument>, CollectionError> {
        self.ensure_open()?;
        let docs = self.docs.read().map_err(|_| poisoned())?;
        Ok(docs.iter().filter(|d| filter.matches(d)).cloned().collect())
    }

    async fn insert_one(&self, doc: ItemDocument) -> Result<DocumentId, CollectionError> {
        self.ensure_open()?;
        let mut docs = self.docs.write().map_err(|_| poisoned())?;
        if docs.iter().any(|d| d.id == doc.id) {
            return Err(CollectionError::transport(format!("duplicate _id {}", doc.id)));
        }
        let id = doc.id;
        docs.push(doc);
        Ok(id)
    }

    async fn update_one(
        &self,
        filter: &Filter,
        update: PriceUpdate,
    ) -> Result<UpdateOutcome, CollectionError> {
        self.ensure_open()?;
        let mut docs = self.docs.write().map_err(|_| poisoned())?;
        match docs.iter_mut().find(|d| filter.matches(d)) {
            Some(doc) => {
                update.apply(doc);
                Ok(UpdateOutcome { matched: 1 })
            }
            None => Ok(UpdateOutcome { matched: 0 }),
        }
    }

    async fn delete_one(&self, filter: &Filter) -> Result<DeleteOutcome, CollectionError> {
        self.ensure_open()?;
        let mut docs = self.docs.write().map_err(|_| poisoned())?;
        match docs.iter().position(|d| filter.matches(d)) {
            Some(idx) => {
                docs.remove(idx);
                Ok(DeleteOutcome { deleted: 1 })
            }
            None => Ok(DeleteOutcome { deleted: 0 }),
        }
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
