//! Store construction and seeding.

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use pricedb_infra::collection::PostgresCollection;
use pricedb_infra::{
    BackendKind, InventoryStore, LocalStore, RemoteStore, StoreConfig, StoreError, StoreResult,
};
use pricedb_inventory::Item;

/// Everything handlers need, injected as `Extension<Arc<AppServices>>`.
pub struct AppServices {
    store: Arc<dyn InventoryStore>,
}

impl AppServices {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn InventoryStore {
        self.store.as_ref()
    }

    /// Release backend resources once the server has drained.
    pub async fn shutdown(&self) {
        self.store.shutdown().await;
    }
}

/// Build the configured store and apply the seed.
///
/// For the postgres backend this blocks until the connection is established
/// or the connect retrier gives up; `cancel` aborts the wait.
pub async fn build_services(
    config: &StoreConfig,
    cancel: &CancellationToken,
) -> anyhow::Result<AppServices> {
    let store: Arc<dyn InventoryStore> = match config.backend {
        BackendKind::Memory => Arc::new(LocalStore::new()),
        BackendKind::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres backend")?;
            let collection = config.collection.as_str();
            let acquire_timeout = config.request_timeout;

            let mut store = RemoteStore::establish(
                &config.connect_retrier(),
                config.connect_timeout,
                cancel,
                config.request_timeout,
                || PostgresCollection::connect(url, collection, acquire_timeout),
            )
            .await
            .context("failed to connect to the document store")?;

            if let Some(retrier) = config.read_retrier() {
                store = store.with_read_retry(retrier);
            }
            Arc::new(store)
        }
    };

    seed(store.as_ref(), &config.seed)
        .await
        .context("failed to seed inventory")?;

    tracing::info!(backend = %config.backend, "inventory store ready");
    Ok(AppServices::new(store))
}

/// Create each item, skipping names that already exist. Returns how many
/// were created.
pub async fn seed(store: &dyn InventoryStore, items: &[Item]) -> StoreResult<usize> {
    let mut created = 0;
    for item in items {
        match store.create(&item.name, item.price).await {
            Ok(()) => created += 1,
            Err(StoreError::AlreadyExists(_)) => {
                tracing::debug!(item = %item.name, "seed item already present");
            }
            Err(err) => return Err(err),
        }
    }
    tracing::info!(created, total = items.len(), "seeded inventory");
    Ok(created)
}
