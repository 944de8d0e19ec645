//! Storage layer for the Flagpost feature-flag service.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! and the one-time schema creation and seeding of the `feature_flags`
//! table.
//!
//! # Design decisions
//!
//! - **SQLite with WAL mode**: a single local file holds all flag state, no
//!   external database process required. WAL allows concurrent readers with
//!   a single writer; concurrent updates to the same row are last-write-wins.
//! - **`r2d2` connection pool**: one storage handle is built at startup and
//!   shared by every request handler.
//! - **Idempotent initialization**: the table is created with
//!   `CREATE TABLE IF NOT EXISTS` and the default flags are only inserted
//!   into an empty table, so restarting against an existing file never
//!   duplicates rows.

mod pool;
mod schema;

pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
pub use schema::{initialize_schema, InitError, DEFAULT_FLAGS};
