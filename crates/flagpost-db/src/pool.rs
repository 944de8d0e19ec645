//! Connection pool creation and configuration.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Runtime tunables for SQLite connection behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// Busy timeout for SQLite connections, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled SQLite connections.
    pub pool_max_size: u32,

    /// How long pool creation and checkout wait for a usable connection,
    /// in milliseconds. Bounds how long an unopenable file stalls startup.
    pub connection_timeout_ms: u64,
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            pool_max_size: 8,
            connection_timeout_ms: 3_000,
        }
    }
}

/// The shared storage handle passed to every request handler.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Errors that can occur when opening the flag database.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The pool could not open its initial connections.
    #[error("failed to open feature flag database '{path}': {source}")]
    Open {
        /// Path the pool was asked to open.
        path: String,
        /// The underlying pool error.
        source: r2d2::Error,
    },
}

/// Opens (creating if absent) the SQLite database at `db_path` behind a
/// connection pool.
///
/// Every new connection is switched to WAL journaling and given the busy
/// timeout from `settings`. Pass `:memory:` for an in-memory database; note
/// that each pooled connection then sees its own private database, so tests
/// using it should set `pool_max_size` to 1.
///
/// # Errors
///
/// Returns `PoolError::Open` if the file cannot be opened or a connection
/// fails its initialization pragmas within `connection_timeout_ms`.
pub fn create_pool(
    db_path: impl AsRef<Path>,
    settings: DbRuntimeSettings,
) -> Result<DbPool, PoolError> {
    let db_path = db_path.as_ref();
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;

    let manager = SqliteConnectionManager::file(db_path)
        .with_flags(flags)
        .with_init(move |conn| {
            // In-memory databases report "memory", which is fine.
            let journal_mode: String =
                conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
            if journal_mode != "wal" && journal_mode != "memory" {
                return Err(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
                    Some(format!(
                        "failed to set WAL journal mode, got: {}",
                        journal_mode
                    )),
                ));
            }
            conn.execute_batch(&format!(
                "PRAGMA busy_timeout = {};",
                settings.busy_timeout_ms
            ))
        });

    let pool = Pool::builder()
        .max_size(settings.pool_max_size)
        .connection_timeout(Duration::from_millis(settings.connection_timeout_ms))
        .build(manager)
        .map_err(|source| PoolError::Open {
            path: db_path.display().to_string(),
            source,
        })?;

    tracing::debug!(
        path = %db_path.display(),
        max_size = settings.pool_max_size,
        "opened feature flag database pool"
    );

    Ok(pool)
}
