//! Ordered schema scripts for the note collection.
//!
//! Script `n` in `SCRIPTS` (zero-based) upgrades the schema to version
//! `n + 1`, so versions are contiguous by construction. All pending scripts
//! run in one transaction together with the `user_version` bump.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

const SCRIPTS: &[&str] = &[include_str!("0001_init.sql")];

/// Schema version produced by applying every known script.
pub fn latest_version() -> u32 {
    SCRIPTS.len() as u32
}

/// Brings `conn` up to `latest_version()`.
///
/// # Errors
/// - `SchemaTooNew` when the database is ahead of this build.
/// - `Sqlite` when a script fails; nothing from the batch is kept.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    let supported = latest_version();

    if found > supported {
        return Err(DbError::SchemaTooNew { found, supported });
    }
    if found == supported {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for script in &SCRIPTS[found as usize..] {
        tx.execute_batch(script)?;
    }
    tx.pragma_update(None, "user_version", supported)?;
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={found} to_version={supported}");
    Ok(())
}
