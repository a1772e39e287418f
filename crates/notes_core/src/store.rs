//! Shared note store handle.
//!
//! # Responsibility
//! - Own the single SQLite connection opened at process start.
//! - Hand out a scoped `NoteService` per use-case call.
//! - Close the connection explicitly at shutdown.
//!
//! # Invariants
//! - The handle is cheap to clone; all clones share one connection.
//! - The schema is checked once, when the handle is built.
//! - A poisoned connection lock surfaces as a storage error, never a panic.

use crate::db::{open_db, open_db_in_memory};
use crate::repo::note_repo::{
    ensure_note_connection_ready, RepoError, RepoResult, SqliteNoteRepository,
};
use crate::service::note_service::{NoteService, NoteServiceError, NoteServiceResult};
use log::{info, warn};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Dependency-injected handle to the backing note store.
#[derive(Clone)]
pub struct NoteStore {
    conn: Arc<Mutex<Connection>>,
}

impl NoteStore {
    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Self::from_connection(open_db(path)?)
    }

    /// Opens a private in-memory database. Data is lost on close.
    pub fn open_in_memory() -> RepoResult<Self> {
        Self::from_connection(open_db_in_memory()?)
    }

    /// Wraps an already migrated connection.
    ///
    /// # Errors
    /// - Returns `MissingRequiredTable`/`MissingRequiredColumn` when the
    ///   connection does not carry the note schema.
    pub fn from_connection(conn: Connection) -> RepoResult<Self> {
        ensure_note_connection_ready(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs one use-case against a service bound to the shared connection.
    pub fn with_notes<T>(
        &self,
        op: impl FnOnce(&mut NoteService<SqliteNoteRepository<'_>>) -> NoteServiceResult<T>,
    ) -> NoteServiceResult<T> {
        let mut conn = self.conn.lock().map_err(|_| {
            NoteServiceError::Storage(RepoError::Unavailable(
                "connection lock poisoned".to_string(),
            ))
        })?;
        let mut service = NoteService::new(SqliteNoteRepository::from_ready(&mut conn));
        op(&mut service)
    }

    /// Closes the underlying connection.
    ///
    /// When other clones are still alive the connection stays open until the
    /// last one is dropped; this is logged and reported as success.
    pub fn close(self) -> Result<(), RepoError> {
        let mutex = match Arc::try_unwrap(self.conn) {
            Ok(mutex) => mutex,
            Err(_) => {
                warn!("event=db_close module=store status=deferred reason=handle_shared");
                return Ok(());
            }
        };
        let conn = mutex
            .into_inner()
            .map_err(|_| RepoError::Unavailable("connection lock poisoned".to_string()))?;
        conn.close().map_err(|(_, err)| RepoError::from(err))?;
        info!("event=db_close module=store status=ok");
        Ok(())
    }
}
