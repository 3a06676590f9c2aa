//! Sona Storage
//!
//! Durable key/value storage for Sona.
//!
//! The playback engine persists its durability snapshot through the
//! [`sona_core::KeyValueStore`] trait. This crate provides two backends:
//!
//! - [`SqliteStore`]: a `SQLite` table behind a sqlx pool. Batched writes run
//!   in a single transaction, so a crash never leaves half a snapshot behind.
//! - [`MemoryStore`]: a process-local map, for tests and ephemeral sessions.
//!
//! # Example
//!
//! ```rust,no_run
//! use sona_core::KeyValueStore;
//! use sona_storage::{create_pool, run_migrations, SqliteStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool("sqlite://sona.db").await?;
//! run_migrations(&pool).await?;
//!
//! let store = SqliteStore::new(pool);
//! store.set("currentIndex", "3".to_string()).await?;
//! assert_eq!(store.get("currentIndex").await?.as_deref(), Some("3"));
//! # Ok(())
//! # }
//! ```

mod error;
mod memory;
mod sqlite;

// Vertical slices
pub mod kv;

pub use error::StorageError;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;
use tracing::debug;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// This should be called once when the application starts to ensure
/// the database schema is up to date.
///
/// # Errors
///
/// Returns an error if migrations fail to run
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `<sqlite://sona.db>`)
///
/// # Errors
///
/// Returns an error if the connection fails
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    debug!(url = %database_url, "Creating SQLite pool");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    debug!("SQLite pool ready");

    Ok(pool)
}
