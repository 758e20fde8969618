use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use super::attribute::Item;
use super::r#trait::{Condition, KeyValueStore, ScanPage, ScanRequest, StoreError, TableRef};

type Table = BTreeMap<String, Item>;

/// In-memory key-value store.
///
/// Intended for tests/dev. Each conditional write checks its precondition and
/// applies the change under a single write lock, so conflicting concurrent
/// writes are serialized exactly like a real store would.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    tables: RwLock<HashMap<String, Table>>,
    unavailable: AtomicBool,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`]
    /// (or recover with `false`).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of items currently stored in `table`.
    pub fn len(&self, table: &TableRef) -> usize {
        self.tables
            .read()
            .map(|tables| tables.get(&table.name).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, table: &TableRef) -> bool {
        self.len(table) == 0
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store switched off".to_string()));
        }
        Ok(())
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get_item(&self, table: &TableRef, key: &str) -> Result<Option<Item>, StoreError> {
        self.check_available()?;
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(tables.get(&table.name).and_then(|t| t.get(key)).cloned())
    }

    async fn scan(&self, table: &TableRef, request: ScanRequest) -> Result<ScanPage, StoreError> {
        self.check_available()?;
        if request.limit == Some(0) {
            return Err(StoreError::Validation("scan limit must be positive".to_string()));
        }

        let tables = self.tables.read().map_err(|_| poisoned())?;
        let Some(rows) = tables.get(&table.name) else {
            return Ok(ScanPage::default());
        };

        let lower = match request.exclusive_start_key.as_deref() {
            Some(start) => Bound::Excluded(start),
            None => Bound::Unbounded,
        };
        let mut remaining = rows.range::<str, _>((lower, Bound::Unbounded));

        let limit = request.limit.unwrap_or(usize::MAX);
        let mut items = Vec::new();
        let mut last_key = None;
        for (key, item) in remaining.by_ref().take(limit) {
            items.push(item.clone());
            last_key = Some(key.clone());
        }

        // Only hand out a continuation key if something is left to read.
        let last_evaluated_key = if remaining.next().is_some() { last_key } else { None };

        Ok(ScanPage {
            items,
            last_evaluated_key,
        })
    }

    async fn put_item(
        &self,
        table: &TableRef,
        item: Item,
        condition: &Condition,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let key = table.key_of(&item)?.to_string();

        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        let rows = tables.entry(table.name.clone()).or_default();

        if !condition.holds(rows.get(&key)) {
            return Err(StoreError::ConditionFailed);
        }
        rows.insert(key, item);
        Ok(())
    }

    async fn delete_item(
        &self,
        table: &TableRef,
        key: &str,
        condition: &Condition,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        if key.is_empty() {
            return Err(StoreError::Validation("key must not be empty".to_string()));
        }

        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        let rows = tables.entry(table.name.clone()).or_default();

        if !condition.holds(rows.get(key)) {
            return Err(StoreError::ConditionFailed);
        }
        rows.remove(key);
        Ok(())
    }
}
