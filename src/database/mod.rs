//! Database layer
//!
//! SQLite persistence through SQLx. Timestamps are stored as unix milliseconds and money
//! as integer cents.

pub mod connection;

pub use connection::DatabaseManager;

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};

/// Begin a transaction that already holds SQLite's write lock.
///
/// Sales, membership payments and closings read their timestamp only after this returns,
/// so the instants they record follow the commit order.
pub async fn begin_takings(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE takings_lock SET generation = generation + 1 WHERE id = 1")
        .execute(&mut *tx)
        .await?;
    Ok(tx)
}

/// Storage representation of an instant
pub fn to_millis(instant: DateTime<Utc>) -> i64 {
    instant.timestamp_millis()
}

/// Instant from its storage representation. Out-of-range values clamp to the epoch.
pub fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Whether a write failed on a UNIQUE constraint
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Whether a write failed on a FOREIGN KEY constraint
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}

/// Lowercased `%needle%` pattern for `lower(column) LIKE ? ESCAPE '\'`
pub fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.trim().to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
