//! Feature-flag model and storage operations for Flagpost.
//!
//! Flags are rows of the `feature_flags` table created by `flagpost-db`.
//! Rows are never inserted or deleted here: the only mutation is flipping
//! `enabled` on the rows picked out by a [`FlagSelector`].

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur during flag operations.
#[derive(Debug, Error)]
pub enum FlagError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// A named boolean toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlag {
    /// Auto-assigned row ID.
    pub id: i64,
    /// Display name. Not unique.
    pub name: String,
    /// Whether the flag is on.
    pub enabled: bool,
}

impl FeatureFlag {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            enabled: row.get(2)?,
        })
    }
}

/// Identifies the rows an update applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagSelector {
    /// The single row with this ID.
    Id(i64),
    /// Every row with exactly this name.
    Name(String),
}

impl fmt::Display for FlagSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagSelector::Id(id) => write!(f, "id={}", id),
            FlagSelector::Name(name) => write!(f, "name={:?}", name),
        }
    }
}

/// Returns every flag, ordered by ID (insertion order).
pub fn list_flags(conn: &Connection) -> Result<Vec<FeatureFlag>, FlagError> {
    let mut stmt = conn.prepare("SELECT id, name, enabled FROM feature_flags ORDER BY id")?;
    let flags = stmt
        .query_map([], FeatureFlag::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(flags)
}

/// Sets `enabled` on every row matched by `selector`.
///
/// Returns the number of rows changed. `0` means nothing matched; a name
/// shared by several rows updates all of them.
pub fn set_enabled(
    conn: &Connection,
    selector: &FlagSelector,
    enabled: bool,
) -> Result<usize, FlagError> {
    let changed = match selector {
        FlagSelector::Id(id) => conn.execute(
            "UPDATE feature_flags SET enabled = ?1 WHERE id = ?2",
            params![enabled, id],
        )?,
        FlagSelector::Name(name) => conn.execute(
            "UPDATE feature_flags SET enabled = ?1 WHERE name = ?2",
            params![enabled, name],
        )?,
    };

    tracing::debug!(%selector, enabled, changed, "applied feature flag update");

    Ok(changed)
}
