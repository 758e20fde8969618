//! Infrastructure layer: the key-value store boundary and the users data access layer.

pub mod kv;
pub mod users;

pub use kv::{InMemoryKeyValueStore, KeyValueStore, StoreError};
pub use users::{RepositoryConfig, UserRepository};
