//! `SQLite`-backed key/value store

use crate::kv;
use async_trait::async_trait;
use sona_core::{KeyValueStore, Result};
use sqlx::SqlitePool;
use tracing::debug;

/// Durable store over the `kv_store` table
///
/// Cheap to clone; clones share the same pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Wrap an existing pool (migrations must already have run)
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (or create) a database, run migrations and wrap it
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or the migrations fail
    pub async fn open(database_url: &str) -> std::result::Result<Self, crate::StorageError> {
        let pool = crate::create_pool(database_url).await?;
        crate::run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Get the pool reference
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(kv::get_value(&self.pool, key).await?)
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        Ok(kv::set_value(&self.pool, key, &value).await?)
    }

    async fn multi_get(&self, keys: &[&str]) -> Result<Vec<(String, Option<String>)>> {
        Ok(kv::get_values(&self.pool, keys).await?)
    }

    async fn multi_set(&self, entries: Vec<(String, String)>) -> Result<()> {
        debug!(count = entries.len(), "Writing key/value batch");
        Ok(kv::set_values(&self.pool, &entries).await?)
    }

    async fn multi_remove(&self, keys: &[&str]) -> Result<()> {
        let removed = kv::remove_values(&self.pool, keys).await?;
        debug!(removed, "Removed key/value batch");
        Ok(())
    }
}
