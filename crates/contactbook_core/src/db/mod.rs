//! Contactbook SQLite store.
//!
//! `open_db` hands back a connection with foreign keys enforced and every
//! migration applied. Reminders and special dates rely on `ON DELETE CASCADE`,
//! so a connection from anywhere else must go through the same bootstrap
//! before repositories accept it.
//!
//! The schema version lives in `PRAGMA user_version`; a store written by a
//! newer contactbook is refused rather than downgraded.

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result of store bootstrap.
pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or migrating the contact store.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Store carries migrations this build does not know about.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "contactbook schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
