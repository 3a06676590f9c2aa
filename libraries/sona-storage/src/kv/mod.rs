//! Key/value blob queries
//!
//! Values are opaque strings (JSON documents written by the caller). Batched
//! writes and removals run inside one transaction.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;

use crate::error::Result;

/// Get a single value
///
/// Returns `Ok(None)` if the key was never written or has been removed
///
/// # Errors
///
/// Returns an error if the database query fails
pub async fn get_value(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv_store WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    Ok(value)
}

/// Insert or replace a single value
///
/// # Errors
///
/// Returns an error if the database query fails
pub async fn set_value(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO kv_store (key, value, updated_at)
         VALUES (?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
    )
    .bind(key)
    .bind(value)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get several values, in the order of `keys`
///
/// All keys are read by one statement, so the result is a consistent view
/// even while a batched write is in progress.
///
/// # Errors
///
/// Returns an error if the database query fails
pub async fn get_values(pool: &SqlitePool, keys: &[&str]) -> Result<Vec<(String, Option<String>)>> {
    if keys.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = QueryBuilder::<Sqlite>::new("SELECT key, value FROM kv_store WHERE key IN (");
    let mut separated = query.separated(", ");
    for key in keys {
        separated.push_bind(*key);
    }
    separated.push_unseparated(")");

    let rows: Vec<(String, String)> = query.build_query_as().fetch_all(pool).await?;
    let found: HashMap<String, String> = rows.into_iter().collect();

    Ok(keys
        .iter()
        .map(|key| ((*key).to_string(), found.get(*key).cloned()))
        .collect())
}

/// Insert or replace several values atomically
///
/// # Errors
///
/// Returns an error if any write fails; in that case nothing is written
pub async fn set_values(pool: &SqlitePool, entries: &[(String, String)]) -> Result<()> {
    let now = chrono::Utc::now().timestamp();
    let mut tx = pool.begin().await?;

    for (key, value) in entries {
        sqlx::query(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Delete several keys atomically
///
/// Returns the number of rows removed
///
/// # Errors
///
/// Returns an error if any delete fails; in that case nothing is removed
pub async fn remove_values(pool: &SqlitePool, keys: &[&str]) -> Result<u64> {
    let mut tx = pool.begin().await?;
    let mut removed = 0;

    for key in keys {
        let result = sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(*key)
            .execute(&mut *tx)
            .await?;
        removed += result.rows_affected();
    }

    tx.commit().await?;
    Ok(removed)
}
