//! Note use-case service.
//!
//! # Responsibility
//! - Provide the create/list/get/delete/attach-todo use-cases.
//! - Collapse repository failures into the two outcomes callers act on:
//!   the note is missing, or the store failed.
//!
//! # Invariants
//! - Each use-case issues exactly one repository operation.
//! - Failures are never retried here.

use crate::model::note::{NewNote, Note, NoteId};
use crate::repo::note_repo::{NoteRepository, RepoError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Target note (or attached todo note) does not exist.
    NotFound(NoteId),
    /// Persistence-layer failure.
    Storage(RepoError),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Storage(other),
        }
    }
}

pub type NoteServiceResult<T> = Result<T, NoteServiceError>;

/// Note service facade over repository implementations.
pub struct NoteService<R: NoteRepository> {
    repo: R,
}

impl<R: NoteRepository> NoteService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one note with an empty todo list.
    pub fn create_note(&self, new_note: &NewNote) -> NoteServiceResult<Note> {
        let note = self.repo.create_note(new_note)?;
        info!(
            "event=note_create module=service status=ok note_id={}",
            note.id
        );
        Ok(note)
    }

    /// Lists every note in store order.
    pub fn list_notes(&self) -> NoteServiceResult<Vec<Note>> {
        Ok(self.repo.list_notes()?)
    }

    /// Gets one note by stable ID.
    pub fn get_note(&self, id: NoteId) -> NoteServiceResult<Note> {
        self.repo.get_note(id)?.ok_or(NoteServiceError::NotFound(id))
    }

    /// Deletes one note. Later lookups of `id` report `NotFound`.
    pub fn delete_note(&self, id: NoteId) -> NoteServiceResult<()> {
        match self.repo.delete_note(id) {
            Ok(()) => {
                info!("event=note_delete module=service status=ok note_id={id}");
                Ok(())
            }
            Err(err) => {
                warn!("event=note_delete module=service status=error note_id={id} error={err}");
                Err(err.into())
            }
        }
    }

    /// Appends the current snapshot of `todo_id` to `note_id` and returns the
    /// updated note.
    pub fn attach_todo(&mut self, note_id: NoteId, todo_id: NoteId) -> NoteServiceResult<Note> {
        match self.repo.attach_todo(note_id, todo_id) {
            Ok(note) => {
                info!(
                    "event=todo_attach module=service status=ok note_id={note_id} todo_id={todo_id}"
                );
                Ok(note)
            }
            Err(err) => {
                warn!(
                    "event=todo_attach module=service status=error note_id={note_id} todo_id={todo_id} error={err}"
                );
                Err(err.into())
            }
        }
    }
}
