//! Infrastructure layer: storage backends, retry, configuration.

pub mod collection;
pub mod config;
pub mod retry;
pub mod store;

pub use config::{BackendKind, Config, ConfigError, SeedError, StoreConfig, parse_seed};
pub use retry::{Backoff, BackoffStrategy, Retrier, RetryError, RetryPolicy};
pub use store::{ConnectError, InventoryStore, LocalStore, RemoteStore, StoreError, StoreResult};
