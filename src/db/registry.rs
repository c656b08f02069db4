//! Adapter registry.
//!
//! Built once at startup from the configured databases and read-only
//! afterwards, so lookups need no locking. Startup is all or nothing: if any
//! adapter fails to initialize, the ones already started are closed again and
//! the error is returned.

use crate::db::adapter::AnyAdapter;
use crate::error::{DbError, DbResult};
use crate::models::{DatabaseConfig, DatabaseSummary};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug)]
struct Entry {
    name: String,
    adapter: Arc<AnyAdapter>,
}

/// Initialized adapters keyed by logical database name.
#[derive(Debug, Default)]
pub struct AdapterRegistry {
    /// In start order
    entries: Vec<Entry>,
}

impl AdapterRegistry {
    /// Build and initialize one adapter per configured database, in name
    /// order.
    pub async fn start(configs: BTreeMap<String, DatabaseConfig>) -> DbResult<Self> {
        let mut registry = Self::default();

        for (name, config) in configs {
            info!(database = %name, driver = %config.db_type, "Initializing adapter");
            match start_one(&name, &config).await {
                Ok(adapter) => {
                    info!(database = %name, "Adapter initialized");
                    registry.entries.push(Entry {
                        name,
                        adapter: Arc::new(adapter),
                    });
                }
                Err(err) => {
                    error!(database = %name, error = %err, "Adapter failed to initialize");
                    registry.close_all().await;
                    return Err(err);
                }
            }
        }

        Ok(registry)
    }

    /// Wrap adapters that are already initialized.
    pub fn from_adapters(adapters: impl IntoIterator<Item = (String, AnyAdapter)>) -> Self {
        Self {
            entries: adapters
                .into_iter()
                .map(|(name, adapter)| Entry {
                    name,
                    adapter: Arc::new(adapter),
                })
                .collect(),
        }
    }

    /// Look up the adapter for a configured database.
    pub fn get(&self, name: &str) -> DbResult<Arc<AnyAdapter>> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| Arc::clone(&entry.adapter))
            .ok_or_else(|| {
                DbError::validation(format!(
                    "Database '{name}' not configured. Available databases: {}",
                    self.names().join(", ")
                ))
            })
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    pub fn summaries(&self) -> Vec<DatabaseSummary> {
        self.entries
            .iter()
            .map(|entry| DatabaseSummary {
                name: entry.name.clone(),
                db_type: entry.adapter.driver_type(),
                read_only: entry.adapter.read_only(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Close every adapter, most recently started first. Adapters log their
    /// own close failures, so one failing does not stop the rest.
    pub async fn close_all(&self) {
        for entry in self.entries.iter().rev() {
            info!(database = %entry.name, "Closing adapter");
            entry.adapter.close().await;
        }
    }
}

async fn start_one(name: &str, config: &DatabaseConfig) -> DbResult<AnyAdapter> {
    let adapter = AnyAdapter::from_config(name, config)?;
    adapter.initialize().await?;
    Ok(adapter)
}
