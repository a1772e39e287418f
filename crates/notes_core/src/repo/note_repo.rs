//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/list/get/delete persistence for notes.
//! - Own the todo append path (`attach_todo`) with atomic semantics.
//!
//! # Invariants
//! - The store assigns note ids; callers never choose them.
//! - Listing order is insertion order (`notes.seq ASC`).
//! - Todo entries are JSON snapshots appended by a single `INSERT` inside an
//!   immediate transaction. The parent's todo list is never rewritten.

use crate::db::DbError;
use crate::model::note::{NewNote, Note, NoteId};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const NOTE_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    body
FROM notes";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for note persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(NoteId),
    InvalidData(String),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// The store handle cannot be used (e.g. a writer panicked mid-operation).
    Unavailable(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
            Self::Unavailable(message) => write!(f, "note store unavailable: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for note operations.
pub trait NoteRepository {
    /// Persists a new note and returns it with its assigned id.
    fn create_note(&self, new_note: &NewNote) -> RepoResult<Note>;
    /// Returns every note in store order.
    fn list_notes(&self) -> RepoResult<Vec<Note>>;
    /// Gets one note by id, including its todo snapshots.
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Removes one note. Snapshots of it held by other notes are kept.
    fn delete_note(&self, id: NoteId) -> RepoResult<()>;
    /// Appends the current snapshot of `todo_id` to `note_id`'s todo list.
    fn attach_todo(&mut self, note_id: NoteId, todo_id: NoteId) -> RepoResult<Note>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_note_connection_ready(conn)?;
        Ok(Self::from_ready(conn))
    }

    /// Wraps a connection that already passed `ensure_note_connection_ready`.
    pub(crate) fn from_ready(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create_note(&self, new_note: &NewNote) -> RepoResult<Note> {
        let note = Note::new(new_note.title.as_str(), new_note.body.as_str());
        self.conn.execute(
            "INSERT INTO notes (uuid, title, body) VALUES (?1, ?2, ?3);",
            params![note.id.to_string(), note.title, note.body],
        )?;
        Ok(note)
    }

    fn list_notes(&self) -> RepoResult<Vec<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} ORDER BY seq ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            let mut note = parse_note_row(row)?;
            note.todo = load_todos_for_note(self.conn, note.id)?;
            notes.push(note);
        }
        Ok(notes)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        load_note(self.conn, id)
    }

    fn delete_note(&self, id: NoteId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn attach_todo(&mut self, note_id: NoteId, todo_id: NoteId) -> RepoResult<Note> {
        // Immediate: take the write lock before reading the snapshot so the
        // snapshot and the append are one unit.
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !note_exists(&tx, note_id)? {
            return Err(RepoError::NotFound(note_id));
        }
        let snapshot = load_note(&tx, todo_id)?.ok_or(RepoError::NotFound(todo_id))?;
        let encoded = serde_json::to_string(&snapshot).map_err(|err| {
            RepoError::InvalidData(format!("cannot encode todo snapshot {todo_id}: {err}"))
        })?;

        tx.execute(
            "INSERT INTO note_todos (note_uuid, snapshot) VALUES (?1, ?2);",
            params![note_id.to_string(), encoded],
        )?;

        let updated = load_note(&tx, note_id)?.ok_or(RepoError::NotFound(note_id))?;
        tx.commit()?;

        debug!(
            "event=todo_append module=repo status=ok note_id={} todo_id={} todo_len={}",
            note_id,
            todo_id,
            updated.todo.len()
        );
        Ok(updated)
    }
}

fn load_note(conn: &Connection, id: NoteId) -> RepoResult<Option<Note>> {
    let note = conn
        .query_row(
            &format!("{NOTE_SELECT_SQL} WHERE uuid = ?1;"),
            [id.to_string()],
            |row| Ok(parse_note_row(row)),
        )
        .optional()?
        .transpose()?;

    match note {
        Some(mut note) => {
            note.todo = load_todos_for_note(conn, note.id)?;
            Ok(Some(note))
        }
        None => Ok(None),
    }
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in notes.uuid"))
    })?;

    Ok(Note::with_id(
        id,
        row.get::<_, String>("title")?,
        row.get::<_, String>("body")?,
    ))
}

fn load_todos_for_note(conn: &Connection, id: NoteId) -> RepoResult<Vec<Note>> {
    let mut stmt = conn.prepare(
        "SELECT id, snapshot
         FROM note_todos
         WHERE note_uuid = ?1
         ORDER BY id ASC;",
    )?;
    let mut rows = stmt.query([id.to_string()])?;
    let mut todos = Vec::new();
    while let Some(row) = rows.next()? {
        let row_id: i64 = row.get(0)?;
        let snapshot: String = row.get(1)?;
        let todo = serde_json::from_str::<Note>(&snapshot).map_err(|err| {
            RepoError::InvalidData(format!(
                "invalid snapshot in note_todos row {row_id}: {err}"
            ))
        })?;
        todos.push(todo);
    }
    Ok(todos)
}

fn note_exists(conn: &Connection, id: NoteId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM notes WHERE uuid = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn ensure_note_connection_ready(conn: &Connection) -> RepoResult<()> {
    const REQUIRED: &[(&str, &[&str])] = &[
        ("notes", &["seq", "uuid", "title", "body"]),
        ("note_todos", &["id", "note_uuid", "snapshot"]),
    ];

    for &(table, columns) in REQUIRED {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
