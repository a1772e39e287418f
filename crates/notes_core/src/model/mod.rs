//! Domain model for notes and their todo snapshots.
//!
//! # Responsibility
//! - Define the canonical `Note` shape shared by storage and HTTP layers.
//!
//! # Invariants
//! - Every note is identified by a stable `NoteId` assigned at creation.
//! - Deletion is a hard delete; snapshots held by other notes survive it.

pub mod note;
