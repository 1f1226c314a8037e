//! Document collection boundary used by the persistent store.
//!
//! The remote store only needs five primitives from its backend: find-one,
//! find-many, insert-one, update-one, and delete-one, each keyed by a
//! [`Filter`]. This module defines that boundary and its implementations.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryCollection;
pub use postgres::PostgresCollection;
pub use r#trait::{
    CollectionError, DeleteOutcome, DocumentCollection, Filter, ItemDocument, PriceUpdate,
    UpdateOutcome,
};
