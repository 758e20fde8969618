//! Key-value store boundary.
//!
//! The users data access layer talks to storage only through
//! [`KeyValueStore`]: single-item reads, paged scans, and writes guarded by an
//! existence [`Condition`] that the store evaluates atomically with the write.

pub mod attribute;
pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod r#trait;

pub use attribute::{AttributeValue, Item};
pub use in_memory::InMemoryKeyValueStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresKeyValueStore;
pub use r#trait::{Condition, KeyValueStore, ScanPage, ScanRequest, StoreError, TableRef};
