//! Feature-flag table creation and first-run seeding.
//!
//! The table is created with `CREATE TABLE IF NOT EXISTS`, and the default
//! flags are inserted only when the table holds no rows. Running the
//! initializer against an already populated database is a no-op.

use rusqlite::{params, Connection};
use thiserror::Error;

const SCHEMA_SQL: &str = include_str!("sql/feature_flags.sql");

/// Flags inserted into an empty table, in insertion order.
pub const DEFAULT_FLAGS: &[(&str, bool)] = &[
    ("New UI", true),
    ("Beta Feature", false),
    ("Dark Mode", true),
    ("Email Notifications", false),
    ("Multi-language Support", true),
    ("Analytics Dashboard", false),
    ("In-App Messaging", true),
    ("Admin Panel Access", false),
    ("Payment Gateway", true),
    ("Advanced Search", false),
];

/// Errors that can occur while preparing the flag table.
#[derive(Debug, Error)]
pub enum InitError {
    /// The `CREATE TABLE` statement failed.
    #[error("failed to create feature_flags table: {0}")]
    CreateTable(rusqlite::Error),

    /// The existing row count could not be read.
    #[error("failed to count existing feature flags: {0}")]
    CountRows(rusqlite::Error),

    /// Inserting one of the default flags failed. The seed transaction is
    /// rolled back, leaving the table empty.
    #[error("failed to seed default flag '{name}': {source}")]
    Seed {
        /// Name of the flag being inserted.
        name: &'static str,
        /// The underlying SQLite error.
        source: rusqlite::Error,
    },

    /// Opening or committing the seed transaction failed.
    #[error("seed transaction failed: {0}")]
    Transaction(rusqlite::Error),
}

/// Creates the `feature_flags` table if needed and seeds it with
/// [`DEFAULT_FLAGS`] when it is empty.
///
/// Returns the number of rows inserted: `DEFAULT_FLAGS.len()` on a fresh
/// database, `0` otherwise.
///
/// # Errors
///
/// Returns `InitError` if any statement fails. The caller treats this as
/// fatal.
pub fn initialize_schema(conn: &Connection) -> Result<usize, InitError> {
    initialize_with_seed(conn, DEFAULT_FLAGS)
}

fn initialize_with_seed(
    conn: &Connection,
    seed: &[(&'static str, bool)],
) -> Result<usize, InitError> {
    conn.execute_batch(SCHEMA_SQL)
        .map_err(InitError::CreateTable)?;

    let existing: i64 = conn
        .query_row("SELECT COUNT(*) FROM feature_flags", [], |row| row.get(0))
        .map_err(InitError::CountRows)?;

    if existing > 0 {
        tracing::debug!(existing, "feature_flags already populated, skipping seed");
        return Ok(0);
    }

    let tx = conn.unchecked_transaction().map_err(InitError::Transaction)?;

    {
        let mut insert = tx
            .prepare("INSERT INTO feature_flags (name, enabled) VALUES (?1, ?2)")
            .map_err(InitError::Transaction)?;

        for &(name, enabled) in seed {
            insert
                .execute(params![name, enabled])
                .map_err(|source| InitError::Seed { name, source })?;
        }
    }

    tx.commit().map_err(InitError::Transaction)?;

    tracing::info!(count = seed.len(), "seeded default feature flags");

    Ok(seed.len())
}
