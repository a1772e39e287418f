//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the note data access contract.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod note_repo;
