//! Note domain model.
//!
//! # Responsibility
//! - Define the stored note record and the create-request payload.
//!
//! # Invariants
//! - `id` is assigned once by the repository and never reused.
//! - `todo` holds owned copies of other notes taken at attach time, in
//!   append order. Duplicates are allowed.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Stable identifier for one note.
pub type NoteId = Uuid;

/// Stored note with its attached todo snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub body: String,
    /// Snapshots of attached notes, oldest first.
    #[serde(default)]
    pub todo: Vec<Note>,
}

impl Note {
    /// Creates a note with a fresh id and an empty todo list.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title, body)
    }

    /// Creates a note with a caller-provided id and an empty todo list.
    pub fn with_id(id: NoteId, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            body: body.into(),
            todo: Vec::new(),
        }
    }
}

/// Create-request payload.
///
/// Each field is read on its own: absent, `null` or non-string values
/// become empty strings without affecting the other field. No other
/// validation applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewNote {
    #[serde(default, deserialize_with = "string_or_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub body: String,
}

impl NewNote {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        _ => Ok(String::new()),
    }
}
