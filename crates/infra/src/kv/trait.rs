use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::attribute::Item;

/// A table and the attribute that holds its primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub name: String,
    pub partition_key: String,
}

impl TableRef {
    pub fn new(name: impl Into<String>, partition_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partition_key: partition_key.into(),
        }
    }

    /// Extract the primary key from an item.
    ///
    /// The key attribute must be present and be a non-empty string.
    pub fn key_of<'a>(&self, item: &'a Item) -> Result<&'a str, StoreError> {
        let value = item.get(&self.partition_key).ok_or_else(|| {
            StoreError::Validation(format!("item is missing key attribute '{}'", self.partition_key))
        })?;

        match value.as_s() {
            Some(key) if !key.is_empty() => Ok(key),
            Some(_) => Err(StoreError::Validation(format!(
                "key attribute '{}' is empty",
                self.partition_key
            ))),
            None => Err(StoreError::Validation(format!(
                "key attribute '{}' must be S, found {}",
                self.partition_key,
                value.type_tag()
            ))),
        }
    }
}

/// Precondition attached to a write.
///
/// The store evaluates it against the item currently stored under the write's
/// key, in the same atomic step as the write. A missing item has no
/// attributes, so `AttributeNotExists` holds for it and `AttributeExists`
/// does not.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Condition {
    /// Unconditional write.
    #[default]
    None,
    /// The current item must carry the attribute.
    AttributeExists(String),
    /// The current item must not carry the attribute (or must not exist).
    AttributeNotExists(String),
}

impl Condition {
    pub fn attribute_exists(attribute: impl Into<String>) -> Self {
        Self::AttributeExists(attribute.into())
    }

    pub fn attribute_not_exists(attribute: impl Into<String>) -> Self {
        Self::AttributeNotExists(attribute.into())
    }

    /// Evaluate against the currently stored item (if any).
    pub fn holds(&self, current: Option<&Item>) -> bool {
        match self {
            Condition::None => true,
            Condition::AttributeExists(attr) => current.is_some_and(|item| item.contains_key(attr)),
            Condition::AttributeNotExists(attr) => !current.is_some_and(|item| item.contains_key(attr)),
        }
    }
}

/// One page request of a full-table scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanRequest {
    /// Maximum items to return; `None` means the whole remaining table.
    pub limit: Option<usize>,
    /// Resume strictly after this primary key (from a previous page).
    pub exclusive_start_key: Option<String>,
}

/// One page of scan results.
///
/// `last_evaluated_key` is `Some` when the scan stopped early and more items
/// may follow; pass it back as `exclusive_start_key` to continue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPage {
    pub items: Vec<Item>,
    pub last_evaluated_key: Option<String>,
}

/// Key-value store operation error.
///
/// - **ConditionFailed**: the write's precondition did not hold; nothing was written
/// - **Validation**: the request itself is malformed (e.g. item without a key)
/// - **Unavailable**: the store could not be reached or failed internally
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("conditional check failed")]
    ConditionFailed,

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Opaque key-value store with conditional writes.
///
/// ## Atomicity
///
/// `put_item` and `delete_item` must evaluate their [`Condition`] and apply the
/// write as one atomic step. Two concurrent writes whose conditions conflict
/// must never both succeed: the loser observes [`StoreError::ConditionFailed`].
///
/// ## Ordering
///
/// `scan` pages are ordered by primary key so that `exclusive_start_key`
/// continuation is well defined. Callers must not rely on any particular order
/// beyond that.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the item stored under `key`, if any.
    async fn get_item(&self, table: &TableRef, key: &str) -> Result<Option<Item>, StoreError>;

    /// Read one page of the table.
    async fn scan(&self, table: &TableRef, request: ScanRequest) -> Result<ScanPage, StoreError>;

    /// Write `item` (keyed by `table.partition_key`) if `condition` holds.
    async fn put_item(
        &self,
        table: &TableRef,
        item: Item,
        condition: &Condition,
    ) -> Result<(), StoreError>;

    /// Remove the item under `key` if `condition` holds.
    async fn delete_item(
        &self,
        table: &TableRef,
        key: &str,
        condition: &Condition,
    ) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> KeyValueStore for Arc<S>
where
    S: KeyValueStore + ?Sized,
{
    async fn get_item(&self, table: &TableRef, key: &str) -> Result<Option<Item>, StoreError> {
        (**self).get_item(table, key).await
    }

    async fn scan(&self, table: &TableRef, request: ScanRequest) -> Result<ScanPage, StoreError> {
        (**self).scan(table, request).await
    }

    async fn put_item(
        &self,
        table: &TableRef,
        item: Item,
        condition: &Condition,
    ) -> Result<(), StoreError> {
        (**self).put_item(table, item, condition).await
    }

    async fn delete_item(
        &self,
        table: &TableRef,
        key: &str,
        condition: &Condition,
    ) -> Result<(), StoreError> {
        (**self).delete_item(table, key, condition).await
    }
}
