//! Layout of the location cache.
//!
//! The cache has exactly one layout so far. A fresh file gets the table and
//! the version stamp in one transaction; a file at the current version must
//! actually hold the table; anything newer is refused untouched.

use super::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, OptionalExtension};

/// `PRAGMA user_version` stamped on a cache created by this build.
pub const LOCATION_SCHEMA_VERSION: u32 = 1;

const LOCATION_TABLE_SQL: &str = include_str!("location.sql");

pub(super) fn ensure_location_schema(conn: &mut Connection) -> DbResult<()> {
    let found: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;

    if found > LOCATION_SCHEMA_VERSION {
        return Err(DbError::CacheFromNewerRelease { found });
    }

    if found == LOCATION_SCHEMA_VERSION {
        return if has_location_table(conn)? {
            Ok(())
        } else {
            Err(DbError::MissingLocationTable)
        };
    }

    let tx = conn.transaction()?;
    tx.execute_batch(LOCATION_TABLE_SQL)?;
    tx.pragma_update(None, "user_version", LOCATION_SCHEMA_VERSION)?;
    tx.commit()?;
    info!("event=db_schema module=db status=created version={LOCATION_SCHEMA_VERSION}");
    Ok(())
}

fn has_location_table(conn: &Connection) -> DbResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'location';",
            [],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}
