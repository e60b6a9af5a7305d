//! Single-slot location cache contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist the last known coordinate pair under the fixed row key `1`.
//! - Own the connection lifecycle (`initialize` / `close`) explicitly.
//!
//! # Invariants
//! - At most one row exists; `save` overwrites, it never appends.
//! - Access to the connection is serialized, so concurrent `save` and
//!   `get_saved` calls observe whole rows only.
//! - Log lines carry no coordinate values.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::coordinate::{Coordinate, CoordinateValidationError};
use log::{debug, error, info, warn};
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Fixed primary key of the only row the cache may hold.
pub const LOCATION_ROW_ID: i64 = 1;

pub type StoreResult<T> = Result<T, StoreError>;

/// Error returned by location store operations.
#[derive(Debug)]
pub enum StoreError {
    /// `initialize` was not called, or the store was closed.
    NotInitialized,
    Validation(CoordinateValidationError),
    Db(DbError),
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "location store is not initialized"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted location data: {message}")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotInitialized | Self::InvalidData(_) => None,
        }
    }
}

impl From<CoordinateValidationError> for StoreError {
    fn from(value: CoordinateValidationError) -> Self {
        Self::Validation(value)
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

/// Durable single-slot cache of the last known coordinate pair.
pub trait LocationStore: Send + Sync {
    /// Opens the backing store and ensures the schema exists. Idempotent.
    fn initialize(&self) -> StoreResult<()>;
    /// Upserts row `1` with the coordinate and the current wall-clock time.
    fn save(&self, coordinate: &Coordinate) -> StoreResult<()>;
    /// Returns the cached coordinate, or `None` when nothing was saved yet.
    fn get_saved(&self) -> StoreResult<Option<Coordinate>>;
    /// Releases the backing store. Idempotent.
    fn close(&self) -> StoreResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum StoreTarget {
    File(PathBuf),
    Memory,
}

/// SQLite-backed location cache.
pub struct SqliteLocationStore {
    target: StoreTarget,
    conn: Mutex<Option<Connection>>,
}

impl SqliteLocationStore {
    /// Creates a closed store backed by the database file at `path`.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::with_target(StoreTarget::File(path.into()))
    }

    /// Creates a closed store backed by a private in-memory database.
    ///
    /// Closing it discards the cached row.
    pub fn in_memory() -> Self {
        Self::with_target(StoreTarget::Memory)
    }

    fn with_target(target: StoreTarget) -> Self {
        Self {
            target,
            conn: Mutex::new(None),
        }
    }

    /// Returns the backing file path, or `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        match &self.target {
            StoreTarget::File(path) => Some(path.as_path()),
            StoreTarget::Memory => None,
        }
    }

    /// Returns whether `initialize` succeeded and `close` was not called since.
    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Connection>> {
        // Poisoning is harmless here: each SQLite statement is atomic.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        let guard = self.lock();
        let conn = guard.as_ref().ok_or(StoreError::NotInitialized)?;
        f(conn)
    }
}

impl LocationStore for SqliteLocationStore {
    fn initialize(&self) -> StoreResult<()> {
        let mut guard = self.lock();
        if guard.is_some() {
            return Ok(());
        }

        let conn = match &self.target {
            StoreTarget::File(path) => open_db(path),
            StoreTarget::Memory => open_db_in_memory(),
        }
        .map_err(|err| {
            error!("event=store_init module=store status=error error={err}");
            StoreError::from(err)
        })?;

        *guard = Some(conn);
        info!(
            "event=store_init module=store status=ok mode={}",
            target_mode(&self.target)
        );
        Ok(())
    }

    fn save(&self, coordinate: &Coordinate) -> StoreResult<()> {
        coordinate.validate()?;

        let result = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO location (id, latitude, longitude, timestamp)
                 VALUES (?1, ?2, ?3, CURRENT_TIMESTAMP)
                 ON CONFLICT(id) DO UPDATE SET
                    latitude = excluded.latitude,
                    longitude = excluded.longitude,
                    timestamp = CURRENT_TIMESTAMP;",
                params![LOCATION_ROW_ID, coordinate.latitude, coordinate.longitude],
            )?;
            Ok(())
        });

        match &result {
            Ok(()) => debug!("event=location_save module=store status=ok"),
            Err(err) => warn!("event=location_save module=store status=error error={err}"),
        }
        result
    }

    fn get_saved(&self) -> StoreResult<Option<Coordinate>> {
        let result = self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT latitude, longitude, timestamp FROM location WHERE id = ?1;",
                    [LOCATION_ROW_ID],
                    |row| {
                        Ok((
                            row.get::<_, f64>(0)?,
                            row.get::<_, f64>(1)?,
                            row.get::<_, Option<String>>(2)?,
                        ))
                    },
                )
                .optional()?;

            let Some((latitude, longitude, timestamp)) = row else {
                return Ok(None);
            };
            let coordinate = Coordinate {
                latitude,
                longitude,
                timestamp,
            };
            coordinate.validate().map_err(|err| {
                StoreError::InvalidData(format!("location row {LOCATION_ROW_ID}: {err}"))
            })?;
            Ok(Some(coordinate))
        });

        match &result {
            Ok(found) => debug!(
                "event=location_load module=store status=ok found={}",
                found.is_some()
            ),
            Err(err) => warn!("event=location_load module=store status=error error={err}"),
        }
        result
    }

    fn close(&self) -> StoreResult<()> {
        let Some(conn) = self.lock().take() else {
            return Ok(());
        };
        conn.close().map_err(|(_, err)| {
            error!("event=store_close module=store status=error error={err}");
            StoreError::from(err)
        })?;
        info!(
            "event=store_close module=store status=ok mode={}",
            target_mode(&self.target)
        );
        Ok(())
    }
}

fn target_mode(target: &StoreTarget) -> &'static str {
    match target {
        StoreTarget::File(_) => "file",
        StoreTarget::Memory => "memory",
    }
}

#[cfg(test)]
mod tests {
    use super::{LocationStore, SqliteLocationStore, StoreError};
    use crate::model::coordinate::Coordinate;

    #[test]
    fn operations_before_initialize_are_rejected() {
        let store = SqliteLocationStore::in_memory();
        assert!(!store.is_open());
        assert!(matches!(store.get_saved(), Err(StoreError::NotInitialized)));

        let coordinate = Coordinate::new(1.0, 2.0).unwrap();
        assert!(matches!(
            store.save(&coordinate),
            Err(StoreError::NotInitialized)
        ));
    }

    #[test]
    fn initialize_is_idempotent_and_keeps_data() {
        let store = SqliteLocationStore::in_memory();
        store.initialize().unwrap();
        store.save(&Coordinate::new(3.0, 4.0).unwrap()).unwrap();

        store.initialize().unwrap();
        let loaded = store.get_saved().unwrap().unwrap();
        assert_eq!((loaded.latitude, loaded.longitude), (3.0, 4.0));
    }

    #[test]
    fn invalid_coordinate_is_not_written() {
        let store = SqliteLocationStore::in_memory();
        store.initialize().unwrap();

        let invalid = Coordinate {
            latitude: 120.0,
            longitude: 0.0,
            timestamp: None,
        };
        assert!(matches!(
            store.save(&invalid),
            Err(StoreError::Validation(_))
        ));
        assert!(store.get_saved().unwrap().is_none());
    }

    #[test]
    fn close_is_idempotent_and_blocks_further_access() {
        let store = SqliteLocationStore::in_memory();
        store.initialize().unwrap();
        store.close().unwrap();
        store.close().unwrap();

        assert!(!store.is_open());
        assert!(matches!(store.get_saved(), Err(StoreError::NotInitialized)));
    }
}
