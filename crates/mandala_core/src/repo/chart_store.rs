//! Chart store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist the grid and chart settings as opaque JSON blobs in a
//!   key-value table.
//! - Keep SQL and serialization details inside the persistence boundary.
//!
//! # Invariants
//! - The grid blob is a JSON array of exactly 81 strings under [`GRID_KEY`].
//! - Reads report corrupt blobs as `StoreError::Corrupt`; callers decide
//!   whether to fall back to defaults.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::grid::Grid;
use crate::model::settings::ChartSettings;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Storage key of the grid blob.
pub const GRID_KEY: &str = "mandala_data_v1";
/// Storage key of the settings blob.
pub const SETTINGS_KEY: &str = "mandala_settings_v1";

pub type StoreResult<T> = Result<T, StoreError>;

/// Error for chart persistence operations.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// Value could not be encoded for storage.
    Encode(String),
    /// Stored blob exists but does not decode.
    Corrupt { key: &'static str, message: String },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(message) => write!(f, "failed to encode chart data: {message}"),
            Self::Corrupt { key, message } => {
                write!(f, "stored value under `{key}` is corrupt: {message}")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(_) | Self::Corrupt { .. } => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence interface used by the chart session.
pub trait ChartStore {
    /// Returns the saved grid, `None` when nothing was saved yet.
    fn load_grid(&self) -> StoreResult<Option<Grid>>;
    fn save_grid(&self, grid: &Grid) -> StoreResult<()>;
    /// Drops the saved grid. Idempotent.
    fn clear_grid(&self) -> StoreResult<()>;
    fn load_settings(&self) -> StoreResult<Option<ChartSettings>>;
    fn save_settings(&self, settings: &ChartSettings) -> StoreResult<()>;
}

/// SQLite-backed chart store owning its connection.
pub struct SqliteChartStore {
    conn: Connection,
}

impl SqliteChartStore {
    /// Opens (and migrates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    /// Opens a throwaway in-memory store.
    pub fn in_memory() -> StoreResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn get_value(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put_value(&self, key: &str, value: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn delete_value(&self, key: &str) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1;", [key])?;
        Ok(())
    }
}

impl ChartStore for SqliteChartStore {
    fn load_grid(&self) -> StoreResult<Option<Grid>> {
        let Some(raw) = self.get_value(GRID_KEY)? else {
            return Ok(None);
        };
        serde_json::from_str::<Grid>(&raw)
            .map(Some)
            .map_err(|err| StoreError::Corrupt {
                key: GRID_KEY,
                message: err.to_string(),
            })
    }

    fn save_grid(&self, grid: &Grid) -> StoreResult<()> {
        let raw =
            serde_json::to_string(grid).map_err(|err| StoreError::Encode(err.to_string()))?;
        self.put_value(GRID_KEY, &raw)
    }

    fn clear_grid(&self) -> StoreResult<()> {
        self.delete_value(GRID_KEY)
    }

    fn load_settings(&self) -> StoreResult<Option<ChartSettings>> {
        let Some(raw) = self.get_value(SETTINGS_KEY)? else {
            return Ok(None);
        };
        serde_json::from_str::<ChartSettings>(&raw)
            .map(Some)
            .map_err(|err| StoreError::Corrupt {
                key: SETTINGS_KEY,
                message: err.to_string(),
            })
    }

    fn save_settings(&self, settings: &ChartSettings) -> StoreResult<()> {
        let raw = serde_json::to_string(settings)
            .map_err(|err| StoreError::Encode(err.to_string()))?;
        self.put_value(SETTINGS_KEY, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::{ChartStore, SqliteChartStore, StoreError, GRID_KEY};

    #[test]
    fn empty_store_has_no_grid() {
        let store = SqliteChartStore::in_memory().unwrap();
        assert!(store.load_grid().unwrap().is_none());
        assert!(store.load_settings().unwrap().is_none());
    }

    #[test]
    fn wrong_length_blob_is_reported_as_corrupt() {
        let store = SqliteChartStore::in_memory().unwrap();
        store.put_value(GRID_KEY, "[\"only one\"]").unwrap();
        let err = store.load_grid().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { key, .. } if key == GRID_KEY));
    }
}
