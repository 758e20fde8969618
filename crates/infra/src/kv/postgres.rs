//! Postgres-backed key-value store implementation.
//!
//! Every logical table lives in one physical table:
//!
//! ```sql
//! kv_items (table_name TEXT, pk TEXT, item JSONB, PRIMARY KEY (table_name, pk))
//! ```
//!
//! ## Conditional writes
//!
//! Preconditions are part of the write statement itself, so Postgres evaluates
//! them under the row lock taken by the write:
//!
//! | Write | Condition | Statement |
//! |-------|-----------|-----------|
//! | put | none | `INSERT .. ON CONFLICT DO UPDATE` |
//! | put | attribute not exists | `INSERT .. ON CONFLICT DO UPDATE .. WHERE NOT (item ? attr)` |
//! | put | attribute exists | `UPDATE .. WHERE item ? attr` |
//! | delete | none / attribute exists | `DELETE .. [WHERE item ? attr]` |
//! | delete | attribute not exists | `SELECT .. FOR UPDATE` + `DELETE` in one transaction |
//!
//! Zero affected rows means the precondition failed.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `ConditionFailed` (lost an insert race) |
//! | Database (other) | any | `Unavailable` |
//! | PoolClosed / Io / other | N/A | `Unavailable` |

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::instrument;

use super::attribute::Item;
use super::r#trait::{Condition, KeyValueStore, ScanPage, ScanRequest, StoreError, TableRef};

/// Postgres-backed key-value store.
///
/// Uses the SQLx connection pool, which is `Send + Sync` and can be shared
/// across request handlers.
#[derive(Debug, Clone)]
pub struct PostgresKeyValueStore {
    pool: Arc<PgPool>,
}

impl PostgresKeyValueStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect to `database_url` and make sure the backing table exists.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Create the `kv_items` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_items (
                table_name TEXT NOT NULL,
                pk TEXT NOT NULL,
                item JSONB NOT NULL,
                PRIMARY KEY (table_name, pk)
            )
            "#,
        )
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }

    async fn delete_if_attribute_missing(
        &self,
        table: &TableRef,
        key: &str,
        attribute: &str,
    ) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("delete_item", e))?;

        let current = sqlx::query(
            "SELECT item ? $3 AS has_attr FROM kv_items WHERE table_name = $1 AND pk = $2 FOR UPDATE",
        )
        .bind(&table.name)
        .bind(key)
        .bind(attribute)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("delete_item", e))?;

        let has_attr = match current {
            Some(row) => row
                .try_get::<bool, _>("has_attr")
                .map_err(|e| map_sqlx_error("delete_item", e))?,
            None => false,
        };
        if has_attr {
            return Err(StoreError::ConditionFailed);
        }

        sqlx::query("DELETE FROM kv_items WHERE table_name = $1 AND pk = $2")
            .bind(&table.name)
            .bind(key)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_item", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("delete_item", e))
    }
}

#[async_trait]
impl KeyValueStore for PostgresKeyValueStore {
    #[instrument(skip(self), fields(table = %table.name), err)]
    async fn get_item(&self, table: &TableRef, key: &str) -> Result<Option<Item>, StoreError> {
        let row = sqlx::query("SELECT item FROM kv_items WHERE table_name = $1 AND pk = $2")
            .bind(&table.name)
            .bind(key)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_item", e))?;

        row.map(|r| {
            r.try_get::<Json<Item>, _>("item")
                .map(|Json(item)| item)
                .map_err(|e| map_sqlx_error("get_item", e))
        })
        .transpose()
    }

    #[instrument(skip(self), fields(table = %table.name), err)]
    async fn scan(&self, table: &TableRef, request: ScanRequest) -> Result<ScanPage, StoreError> {
        let limit = match request.limit {
            Some(0) => {
                return Err(StoreError::Validation("scan limit must be positive".to_string()));
            }
            // Fetch one extra row to learn whether another page follows.
            Some(n) => Some(i64::try_from(n).unwrap_or(i64::MAX - 1) + 1),
            None => None,
        };

        let rows = sqlx::query(
            r#"
            SELECT pk, item
            FROM kv_items
            WHERE table_name = $1
                AND ($2::text IS NULL OR pk > $2)
            ORDER BY pk ASC
            LIMIT $3
            "#,
        )
        .bind(&table.name)
        .bind(request.exclusive_start_key.as_deref())
        .bind(limit)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("scan", e))?;

        let page_size = request.limit.unwrap_or(usize::MAX);
        let has_more = rows.len() > page_size;

        let mut items = Vec::with_capacity(rows.len().min(page_size));
        let mut last_key = None;
        for row in rows.into_iter().take(page_size) {
            let pk: String = row.try_get("pk").map_err(|e| map_sqlx_error("scan", e))?;
            let Json(item): Json<Item> = row.try_get("item").map_err(|e| map_sqlx_error("scan", e))?;
            items.push(item);
            last_key = Some(pk);
        }

        Ok(ScanPage {
            items,
            last_evaluated_key: if has_more { last_key } else { None },
        })
    }

    #[instrument(skip(self, item), fields(table = %table.name), err)]
    async fn put_item(
        &self,
        table: &TableRef,
        item: Item,
        condition: &Condition,
    ) -> Result<(), StoreError> {
        let key = table.key_of(&item)?.to_string();

        let result = match condition {
            Condition::None => {
                sqlx::query(
                    r#"
                    INSERT INTO kv_items (table_name, pk, item) VALUES ($1, $2, $3)
                    ON CONFLICT (table_name, pk) DO UPDATE SET item = EXCLUDED.item
                    "#,
                )
                .bind(&table.name)
                .bind(&key)
                .bind(Json(&item))
                .execute(&*self.pool)
                .await
            }
            Condition::AttributeNotExists(attr) => {
                sqlx::query(
                    r#"
                    INSERT INTO kv_items (table_name, pk, item) VALUES ($1, $2, $3)
                    ON CONFLICT (table_name, pk) DO UPDATE SET item = EXCLUDED.item
                    WHERE NOT (kv_items.item ? $4)
                    "#,
                )
                .bind(&table.name)
                .bind(&key)
                .bind(Json(&item))
                .bind(attr)
                .execute(&*self.pool)
                .await
            }
            Condition::AttributeExists(attr) => {
                sqlx::query(
                    "UPDATE kv_items SET item = $3 WHERE table_name = $1 AND pk = $2 AND item ? $4",
                )
                .bind(&table.name)
                .bind(&key)
                .bind(Json(&item))
                .bind(attr)
                .execute(&*self.pool)
                .await
            }
        }
        .map_err(|e| map_sqlx_error("put_item", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ConditionFailed);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(table = %table.name), err)]
    async fn delete_item(
        &self,
        table: &TableRef,
        key: &str,
        condition: &Condition,
    ) -> Result<(), StoreError> {
        let result = match condition {
            Condition::None => {
                sqlx::query("DELETE FROM kv_items WHERE table_name = $1 AND pk = $2")
                    .bind(&table.name)
                    .bind(key)
                    .execute(&*self.pool)
                    .await
            }
            Condition::AttributeExists(attr) => {
                sqlx::query(
                    "DELETE FROM kv_items WHERE table_name = $1 AND pk = $2 AND item ? $3",
                )
                .bind(&table.name)
                .bind(key)
                .bind(attr)
                .execute(&*self.pool)
                .await
            }
            Condition::AttributeNotExists(attr) => {
                return self.delete_if_attribute_missing(table, key, attr).await;
            }
        }
        .map_err(|e| map_sqlx_error("delete_item", e))?;

        if matches!(condition, Condition::AttributeExists(_)) && result.rows_affected() == 0 {
            return Err(StoreError::ConditionFailed);
        }
        Ok(())
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some("23505") {
                return StoreError::ConditionFailed;
            }
            StoreError::Unavailable(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed during {operation}"))
        }
        other => StoreError::Unavailable(format!("{operation} failed: {other}")),
    }
}
