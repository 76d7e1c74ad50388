//! Serialized check-then-write scope for conflict-checked mutations.
//!
//! Conflict checks read current rows and only then write. Two connections
//! running the same check concurrently could both pass before either
//! commits. Wrapping the whole use-case in `BEGIN IMMEDIATE` takes the
//! SQLite write lock before the first read, so the second writer waits
//! (up to the busy timeout) and then sees the first writer's rows.

use super::DbError;
use log::warn;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Runs `operation` inside an immediate transaction on `conn`.
///
/// Commits when `operation` returns `Ok`, rolls back on `Err`. Repositories
/// used inside the closure must borrow the same `conn`.
pub fn serialized_write<T, E, F>(conn: &Connection, operation: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: From<DbError>,
{
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(DbError::from)?;

    match operation() {
        Ok(value) => {
            tx.commit().map_err(DbError::from)?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                warn!("event=serialized_write module=db status=error error_code=rollback_failed error={rollback_err}");
            }
            Err(err)
        }
    }
}
