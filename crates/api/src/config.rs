//! Service configuration, read from environment variables.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `BIND_ADDR` | `0.0.0.0:8080` | HTTP listen address |
//! | `USERS_TABLE` | `users` | logical table holding user records |
//! | `SCAN_PAGE_SIZE` | `100` | items per scan round trip when listing |
//! | `STATUS_MAPPING` | `collapsed` | `collapsed` (all errors 400) or `typed` |
//! | `USE_PERSISTENT_STORES` | `false` | use Postgres instead of the in-memory store |
//! | `DATABASE_URL` | — | required when `USE_PERSISTENT_STORES=true` |
//! | `LOG_FORMAT` | `json` | `json` or `text` |
//! | `LOG_LEVEL` | `info` | filter used when `RUST_LOG` is unset |

use std::net::SocketAddr;

use thiserror::Error;

use usersvc_infra::RepositoryConfig;
use usersvc_observability::{LogFormat, LoggingConfig};

use crate::dispatch::StatusPolicy;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be set")]
    Missing { var: &'static str },

    #[error("invalid {var}={value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Which key-value store backs the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persistence {
    InMemory,
    Postgres { database_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub repository: RepositoryConfig,
    pub status_policy: StatusPolicy,
    pub persistence: Persistence,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            repository: RepositoryConfig::default(),
            status_policy: StatusPolicy::default(),
            persistence: Persistence::InMemory,
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load from any variable source; unset or blank variables take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let bind_addr = parse_var(&get, "BIND_ADDR", |v| {
            v.parse::<SocketAddr>().map_err(|e| e.to_string())
        })?
        .unwrap_or(defaults.bind_addr);

        let table = get("USERS_TABLE").unwrap_or(defaults.repository.table);

        let scan_page_size = parse_var(&get, "SCAN_PAGE_SIZE", |v| match v.parse::<usize>() {
            Ok(0) => Err("must be greater than zero".to_string()),
            Ok(n) => Ok(n),
            Err(e) => Err(e.to_string()),
        })?
        .unwrap_or(defaults.repository.scan_page_size);

        let status_policy = parse_var(&get, "STATUS_MAPPING", |v| v.parse::<StatusPolicy>())?
            .unwrap_or(defaults.status_policy);

        let use_persistent = parse_var(&get, "USE_PERSISTENT_STORES", |v| {
            v.trim().parse::<bool>().map_err(|e| e.to_string())
        })?
        .unwrap_or(false);

        let persistence = if use_persistent {
            let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing {
                var: "DATABASE_URL",
            })?;
            Persistence::Postgres { database_url }
        } else {
            Persistence::InMemory
        };

        let format = parse_var(&get, "LOG_FORMAT", |v| v.parse::<LogFormat>())?
            .unwrap_or(defaults.logging.format);
        let default_filter = get("LOG_LEVEL").unwrap_or(defaults.logging.default_filter);

        Ok(Self {
            bind_addr,
            repository: RepositoryConfig {
                table,
                scan_page_size,
            },
            status_policy,
            persistence,
            logging: LoggingConfig {
                format,
                default_filter,
            },
        })
    }
}

fn parse_var<G, T, P>(get: &G, var: &'static str, parse: P) -> Result<Option<T>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    P: FnOnce(&str) -> Result<T, String>,
{
    match get(var) {
        None => Ok(None),
        Some(value) => parse(&value).map(Some).map_err(|reason| ConfigError::Invalid {
            var,
            value,
            reason,
        }),
    }
}
