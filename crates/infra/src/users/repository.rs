use tracing::instrument;

use usersvc_core::{Entity, User, UserError, UserId, UserResult, WriteRejection};

use super::codec;
use crate::kv::{Condition, KeyValueStore, ScanRequest, StoreError, TableRef};

/// Where users live and how listing pages through them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Logical table name.
    pub table: String,
    /// Items requested per scan round trip while listing.
    pub scan_page_size: usize,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            table: "users".to_string(),
            scan_page_size: 100,
        }
    }
}

/// Data access layer for [`User`] records.
///
/// Every write carries a store-side existence precondition on the key
/// attribute; the repository never reads before writing. The store handle is
/// injected at construction (use `Arc<S>` to share one store).
#[derive(Debug)]
pub struct UserRepository<S> {
    store: S,
    table: TableRef,
    scan_page_size: usize,
}

impl<S> UserRepository<S> {
    pub fn new(store: S, config: RepositoryConfig) -> Self {
        Self {
            store,
            table: TableRef::new(config.table, User::KEY_ATTRIBUTE),
            scan_page_size: config.scan_page_size.max(1),
        }
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S> UserRepository<S>
where
    S: KeyValueStore,
{
    /// Look up one user by primary key.
    #[instrument(skip(self), fields(table = %self.table.name))]
    pub async fn fetch_by_id(&self, id: &str) -> UserResult<User> {
        let id = UserId::new(id)?;

        let item = self
            .store
            .get_item(&self.table, id.as_str())
            .await
            .map_err(|e| read_error("get_item", e))?
            .ok_or(UserError::NotFound)?;

        codec::from_item(&item)
    }

    /// Materialize every stored user.
    ///
    /// Walks the table one scan page at a time until the store reports no
    /// continuation key. A record that does not decode fails the whole call.
    #[instrument(skip(self), fields(table = %self.table.name, page_size = self.scan_page_size))]
    pub async fn list_all(&self) -> UserResult<Vec<User>> {
        let mut users = Vec::new();
        let mut start_after = None;

        loop {
            let page = self
                .store
                .scan(
                    &self.table,
                    ScanRequest {
                        limit: Some(self.scan_page_size),
                        exclusive_start_key: start_after.take(),
                    },
                )
                .await
                .map_err(|e| read_error("scan", e))?;

            for item in &page.items {
                users.push(codec::from_item(item)?);
            }

            match page.last_evaluated_key {
                Some(key) => start_after = Some(key),
                None => break,
            }
        }

        tracing::debug!(count = users.len(), "listed users");
        Ok(users)
    }

    /// Insert `candidate` only if no user with its ID exists.
    #[instrument(skip(self, candidate), fields(table = %self.table.name, id = %candidate.id))]
    pub async fn create(&self, candidate: User) -> UserResult<User> {
        self.conditional_put(
            candidate,
            Condition::attribute_not_exists(User::KEY_ATTRIBUTE),
            WriteRejection::AlreadyExists,
        )
        .await
    }

    /// Fully replace the user with `candidate`'s ID, only if it exists.
    #[instrument(skip(self, candidate), fields(table = %self.table.name, id = %candidate.id))]
    pub async fn replace(&self, candidate: User) -> UserResult<User> {
        self.conditional_put(
            candidate,
            Condition::attribute_exists(User::KEY_ATTRIBUTE),
            WriteRejection::DoesNotExist,
        )
        .await
    }

    /// Remove the user with `id`, only if it exists.
    #[instrument(skip(self), fields(table = %self.table.name))]
    pub async fn delete(&self, id: &str) -> UserResult<()> {
        let id = UserId::new(id)?;

        self.store
            .delete_item(
                &self.table,
                id.as_str(),
                &Condition::attribute_exists(User::KEY_ATTRIBUTE),
            )
            .await
            .map_err(|e| write_error("delete_item", e, WriteRejection::DoesNotExist))
    }

    async fn conditional_put(
        &self,
        candidate: User,
        condition: Condition,
        rejection: WriteRejection,
    ) -> UserResult<User> {
        candidate.validate()?;

        self.store
            .put_item(&self.table, codec::to_item(&candidate), &condition)
            .await
            .map_err(|e| write_error("put_item", e, rejection))?;

        Ok(candidate)
    }
}

fn read_error(operation: &str, err: StoreError) -> UserError {
    match err {
        StoreError::Validation(msg) => UserError::invalid_input(msg),
        // Reads carry no condition; treat a stray one like any other store fault.
        StoreError::ConditionFailed | StoreError::Unavailable(_) => {
            tracing::warn!(operation, error = %err, "store read failed");
            UserError::read_unavailable(err.to_string())
        }
    }
}

fn write_error(operation: &str, err: StoreError, rejection: WriteRejection) -> UserError {
    match err {
        StoreError::ConditionFailed => UserError::StoreWriteRejected(rejection),
        StoreError::Validation(msg) => UserError::invalid_input(msg),
        StoreError::Unavailable(_) => {
            tracing::warn!(operation, error = %err, "store write failed");
            UserError::write_unavailable(err.to_string())
        }
    }
}
