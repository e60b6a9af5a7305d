//! SQLite storage for the last-known-location cache.
//!
//! # Responsibility
//! - Open and configure the cache database.
//! - Create the single-slot `location` table on first open.
//!
//! # Invariants
//! - The cache layout version lives in `PRAGMA user_version`.
//! - A connection is only handed out once the `location` table is in place.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
mod schema;

pub use open::{open_db, open_db_in_memory};
pub use schema::LOCATION_SCHEMA_VERSION;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file was written by a newer release with a different cache layout.
    CacheFromNewerRelease { found: u32 },
    /// The file claims the current layout but has no `location` table.
    MissingLocationTable,
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::CacheFromNewerRelease { found } => write!(
                f,
                "location cache layout {found} is newer than this build understands ({LOCATION_SCHEMA_VERSION})"
            ),
            Self::MissingLocationTable => {
                write!(f, "database is not a location cache: `location` table is missing")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::CacheFromNewerRelease { .. } | Self::MissingLocationTable => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
