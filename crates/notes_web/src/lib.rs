//! HTTP surface for the notes service.
//!
//! # Responsibility
//! - Expose the note use-cases as REST routes with JSON and HTML views.
//! - Translate use-case failures into HTTP status codes.
//!
//! # Invariants
//! - Handlers must not panic; every failure becomes an `ApiError` response.
//! - The store handle is injected through `AppState`; this crate never opens
//!   or closes it.

mod error;
mod presenter;
mod request_log;
mod router;

pub use error::ApiError;
pub use presenter::{HtmlPresenter, JsonPresenter, NotePresenter, Views};
pub use router::{router, AppState, DELETED_MESSAGE};
