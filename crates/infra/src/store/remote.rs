//! Inventory store backed by a persistent document collection.
//!
//! ## Connection
//!
//! [`RemoteStore::establish`] runs the caller's connect step under a
//! [`Retrier`] with an overall deadline. Failure after the last attempt is
//! fatal for start-up and reported as [`ConnectError`]; per-request failures
//! afterwards are local to the request.
//!
//! ## Per-request bounds
//!
//! Every collection call runs under `request_timeout`. Expiry maps to
//! [`StoreError::Timeout`]; collection errors map to [`StoreError::Backend`].
//!
//! ## Consistency
//!
//! There is no in-process lock. `create` checks for an existing document and
//! then inserts; two concurrent creates for the same name can both pass the
//! check and both insert. That race is accepted: the backend owns
//! consistency, and later find/update/delete calls act on the first match.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use pricedb_core::Money;
use pricedb_inventory::Item;

use crate::collection::{CollectionError, DocumentCollection, Filter, ItemDocument, PriceUpdate};
use crate::retry::{Retrier, RetryError};

use super::r#trait::{InventoryStore, StoreError, StoreResult};

/// Start-up connection failure. The process must not serve after this.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("could not connect to document store after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: CollectionError },

    #[error("document store connection deadline exceeded after {attempts} attempts")]
    DeadlineExceeded {
        attempts: u32,
        last: Option<CollectionError>,
    },

    #[error("document store connection cancelled")]
    Cancelled,
}

impl From<RetryError<CollectionError>> for ConnectError {
    fn from(err: RetryError<CollectionError>) -> Self {
        match err {
            RetryError::Exhausted { attempts, last } => Self::Exhausted { attempts, last },
            RetryError::DeadlineExceeded { attempts, last } => Self::DeadlineExceeded { attempts, last },
            RetryError::Cancelled { .. } => Self::Cancelled,
        }
    }
}

/// Inventory store over a [`DocumentCollection`].
#[derive(Debug)]
pub struct RemoteStore<C> {
    collection: C,
    request_timeout: Duration,
    read_retry: Option<Retrier>,
}

impl<C> RemoteStore<C>
where
    C: DocumentCollection,
{
    pub fn new(collection: C, request_timeout: Duration) -> Self {
        Self {
            collection,
            request_timeout,
            read_retry: None,
        }
    }

    /// Repeat `get`/`list` on transient collection errors, within the same
    /// per-request timeout. Mutations are never repeated.
    pub fn with_read_retry(mut self, retrier: Retrier) -> Self {
        self.read_retry = Some(retrier);
        self
    }

    /// Connect with retry, then wrap the collection.
    ///
    /// Each attempt is cut off at the overall deadline
    /// (`now + connect_timeout`).
    pub async fn establish<F, Fut>(
        retrier: &Retrier,
        connect_timeout: Duration,
        cancel: &CancellationToken,
        request_timeout: Duration,
        mut connect: F,
    ) -> Result<Self, ConnectError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<C, CollectionError>>,
    {
        let deadline = Instant::now() + connect_timeout;

        let collection = retrier
            .retry("connect", Some(deadline), cancel, || {
                let attempt = connect();
                async move {
                    tokio::time::timeout_at(deadline, attempt)
                        .await
                        .unwrap_or_else(|_| Err(CollectionError::transport("connection attempt timed out")))
                }
            })
            .await?;

        tracing::info!(?request_timeout, "connected to document store");
        Ok(Self::new(collection, request_timeout))
    }

    pub fn collection(&self) -> &C {
        &self.collection
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, CollectionError>>,
    ) -> StoreResult<T> {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                tracing::warn!(operation, error = %err, "document store call failed");
                Err(err.into())
            }
            Err(_) => {
                tracing::warn!(operation, timeout = ?self.request_timeout, "document store call timed out");
                Err(StoreError::Timeout(self.request_timeout))
            }
        }
    }

    async fn read<T, F, Fut>(&self, operation: &'static str, mut call: F) -> StoreResult<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, CollectionError>> + Send,
        T: Send,
    {
        let Some(retrier) = &self.read_retry else {
            return self.bounded(operation, call()).await;
        };

        // Non-transient errors short-circuit the retrier as `Ok(Err(_))`.
        let cancel = CancellationToken::new();
        let retried = retrier.retry(operation, None, &cancel, || {
            let attempt = call();
            async move {
                match attempt.await {
                    Err(err) if err.is_transient() => Err(err),
                    other => Ok(other),
                }
            }
        });

        let flattened = async move {
            match retried.await {
                Ok(result) => result,
                Err(err) => Err(err
                    .into_last()
                    .unwrap_or_else(|| CollectionError::transport("read retry gave up"))),
            }
        };

        self.bounded(operation, flattened).await
    }
}

#[async_trait]
impl<C> InventoryStore for RemoteStore<C>
where
    C: DocumentCollection,
{
    #[instrument(skip(self), level = "debug")]
    async fn get(&self, name: &str) -> StoreResult<Item> {
        let filter = Filter::item(name);
        let doc = self
            .read("find_one", || self.collection.find_one(&filter))
            .await?;
        doc.map(|d| d.to_item())
            .ok_or_else(|| StoreError::not_found(name))
    }

    #[instrument(skip(self), level = "debug")]
    async fn list(&self) -> StoreResult<Vec<Item>> {
        let docs = self
            .read("find_many", || self.collection.find_many(&Filter::All))
            .await?;
        Ok(docs.iter().map(ItemDocument::to_item).collect())
    }

    #[instrument(skip(self), level = "debug")]
    async fn create(&self, name: &str, price: Money) -> StoreResult<()> {
        let filter = Filter::item(name);
        if self
            .bounded("find_one", self.collection.find_one(&filter))
            .await?
            .is_some()
        {
            return Err(StoreError::already_exists(name));
        }

        let doc = ItemDocument::new(name, price, Utc::now());
        let id = self
            .bounded("insert_one", self.collection.insert_one(doc))
            .await?;
        tracing::info!(item = name, %id, "inserted item document");
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn update(&self, name: &str, price: Money) -> StoreResult<()> {
        let filter = Filter::item(name);
        let update = PriceUpdate::new(price, Utc::now());
        let outcome = self
            .bounded("update_one", self.collection.update_one(&filter, update))
            .await?;
        if outcome.matched == 0 {
            return Err(StoreError::not_found(name));
        }
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete(&self, name: &str) -> StoreResult<()> {
        let filter = Filter::item(name);
        let outcome = self
            .bounded("delete_one", self.collection.delete_one(&filter))
            .await?;
        if outcome.deleted == 0 {
            return Err(StoreError::not_found(name));
        }
        Ok(())
    }

    async fn shutdown(&self) {
        self.collection.close().await;
        tracing::info!("document store connection closed");
    }
}
