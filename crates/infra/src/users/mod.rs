//! Users data access layer.
//!
//! [`UserRepository`] is the only component that knows how a [`usersvc_core::User`]
//! is laid out in the key-value store (see [`codec`]).

pub mod codec;
pub mod repository;

pub use repository::{RepositoryConfig, UserRepository};
