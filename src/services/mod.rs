//! Dispatch operations exposed to the rest of the application.
//!
//! Handlers are thin adapters over these functions; anything in here can be
//! called in-process without HTTP.

pub mod claims;
pub mod fleet;
pub mod ledger;
pub mod rentals;

use sea_orm::{DbErr, RuntimeErr, SqlErr};

/// Postgres: serialization failure, deadlock.
const PG_CONFLICT_CODES: [&str; 2] = ["40001", "40P01"];

/// SQLite extended result codes in the BUSY and LOCKED families.
const SQLITE_CONFLICT_CODES: [&str; 6] = ["5", "261", "517", "773", "6", "262"];

/// Error code reported by the database for a failed statement, if any.
fn database_code(err: &DbErr) -> Option<String> {
    match err {
        DbErr::Exec(RuntimeErr::SqlxError(e))
        | DbErr::Query(RuntimeErr::SqlxError(e))
        | DbErr::Conn(RuntimeErr::SqlxError(e)) => e
            .as_database_error()
            .and_then(|db_err| db_err.code())
            .map(|code| code.into_owned()),
        _ => None,
    }
}

/// Whether the database aborted a statement or commit because of a
/// competing write.
pub(crate) fn is_write_conflict(err: &DbErr) -> bool {
    database_code(err).is_some_and(|code| {
        PG_CONFLICT_CODES.contains(&code.as_str()) || SQLITE_CONFLICT_CODES.contains(&code.as_str())
    })
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
