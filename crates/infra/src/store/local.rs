use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use pricedb_core::Money;
use pricedb_inventory::Item;

use super::r#trait::{InventoryStore, StoreError, StoreResult};

/// Process-local inventory store.
///
/// One `RwLock` covers the whole map. Every mutation holds the write lock
/// across its existence check and its write, so two callers racing on the
/// same name cannot both succeed a create or both succeed a delete. Reads
/// take the read lock, so they never observe a half-applied mutation and
/// always see the caller's own completed writes.
#[derive(Debug, Default)]
pub struct LocalStore {
    items: RwLock<HashMap<String, Item>>,
}

impl LocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `items`. Later duplicates replace earlier ones.
    pub fn with_items(items: impl IntoIterator<Item = Item>) -> Self {
        let map = items
            .into_iter()
            .map(|item| (item.name.clone(), item))
            .collect();
        Self {
            items: RwLock::new(map),
        }
    }

    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<String, Item>>> {
        self.items
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<String, Item>>> {
        self.items
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))
    }
}

#[async_trait]
impl InventoryStore for LocalStore {
    async fn get(&self, name: &str) -> StoreResult<Item> {
        self.read()?
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::not_found(name))
    }

    async fn list(&self) -> StoreResult<Vec<Item>> {
        let items = self.read()?;
        Ok(items.values().cloned().collect())
    }

    async fn create(&self, name: &str, price: Money) -> StoreResult<()> {
        let mut items = self.write()?;
        match items.entry(name.to_string()) {
            Entry::Occupied(_) => Err(StoreError::already_exists(name)),
            Entry::Vacant(slot) => {
                slot.insert(Item {
                    name: name.to_string(),
                    price,
                });
                Ok(())
            }
        }
    }

    async fn update(&self, name: &str, price: Money) -> StoreResult<()> {
        let mut items = self.write()?;
        match items.get_mut(name) {
            Some(item) => {
                item.price = price;
                Ok(())
            }
            None => Err(StoreError::not_found(name)),
        }
    }

    async fn delete(&self, name: &str) -> StoreResult<()> {
        let mut items = self.write()?;
        items
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(name))
    }
}
