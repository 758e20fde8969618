use std::sync::Arc;

use usersvc_infra::kv::{InMemoryKeyValueStore, KeyValueStore};
use usersvc_infra::UserRepository;

use crate::config::{AppConfig, Persistence};
use crate::dispatch::Dispatcher;

/// Store handle shared by every request.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Dispatcher over whichever store the configuration selected.
pub type SharedDispatcher = Dispatcher<SharedStore>;

/// Services handed to route handlers.
#[derive(Clone)]
pub struct AppServices {
    pub dispatcher: SharedDispatcher,
}

impl AppServices {
    /// Wire a repository and dispatcher over an existing store.
    pub fn with_store(store: SharedStore, config: &AppConfig) -> Self {
        let repository = Arc::new(UserRepository::new(store, config.repository.clone()));
        Self {
            dispatcher: Dispatcher::new(repository, config.status_policy),
        }
    }
}

pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let store = match &config.persistence {
        Persistence::InMemory => in_memory_store(),
        Persistence::Postgres { database_url } => persistent_store(database_url).await?,
    };
    tracing::info!(
        table = %config.repository.table,
        status_policy = ?config.status_policy,
        "user services ready"
    );
    Ok(AppServices::with_store(store, config))
}

fn in_memory_store() -> SharedStore {
    tracing::info!("using in-memory key-value store");
    Arc::new(InMemoryKeyValueStore::new())
}

#[cfg(feature = "postgres")]
async fn persistent_store(database_url: &str) -> anyhow::Result<SharedStore> {
    use anyhow::Context;

    let store = usersvc_infra::kv::PostgresKeyValueStore::connect(database_url)
        .await
        .context("failed to open Postgres key-value store")?;
    tracing::info!("using Postgres key-value store");
    Ok(Arc::new(store))
}

#[cfg(not(feature = "postgres"))]
async fn persistent_store(_database_url: &str) -> anyhow::Result<SharedStore> {
    tracing::warn!(
        "USE_PERSISTENT_STORES=true but postgres feature not enabled, falling back to in-memory"
    );
    Ok(in_memory_store())
}
