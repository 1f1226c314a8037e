//! Inventory storage boundary.
//!
//! [`InventoryStore`] is the single point through which handlers read and
//! mutate items. Two implementations exist:
//!
//! - [`LocalStore`]: process-local map guarded by one lock.
//! - [`RemoteStore`]: client of a persistent [`DocumentCollection`](crate::collection::DocumentCollection).

pub mod local;
pub mod remote;
pub mod r#trait;

pub use local::LocalStore;
pub use remote::{ConnectError, RemoteStore};
pub use r#trait::{InventoryStore, StoreError, StoreResult};
