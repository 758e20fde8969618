//! `usersvc-core` — the user record and its error taxonomy.
//!
//! This crate contains **pure domain** types (no storage or transport concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod user;

pub use entity::Entity;
pub use error::{ErrorKind, StoreAccess, UserError, UserResult, WriteRejection};
pub use id::UserId;
pub use user::User;
