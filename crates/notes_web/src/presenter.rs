//! Note presenters.
//!
//! # Responsibility
//! - Turn an already fetched `Note` into a response body.
//! - Own the embedded HTML templates.
//!
//! # Invariants
//! - Presenters never touch the store; the JSON and HTML forms of one path
//!   render the same fetched value.
//! - HTML output is auto-escaped (templates are registered with `.html`
//!   names).

use crate::error::ApiError;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use minijinja::{context, Environment};
use notes_core::Note;

const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");
const NOTE_TEMPLATE: &str = include_str!("../templates/note.html");

/// Renders one note into a response representation.
pub trait NotePresenter {
    fn present(&self, note: Note) -> Result<Response, ApiError>;
}

/// Programmatic representation: the note as JSON.
pub struct JsonPresenter;

impl NotePresenter for JsonPresenter {
    fn present(&self, note: Note) -> Result<Response, ApiError> {
        Ok(Json(note).into_response())
    }
}

/// Browser representation: the note detail view.
pub struct HtmlPresenter<'a> {
    views: &'a Views,
}

impl<'a> HtmlPresenter<'a> {
    pub fn new(views: &'a Views) -> Self {
        Self { views }
    }
}

impl NotePresenter for HtmlPresenter<'_> {
    fn present(&self, note: Note) -> Result<Response, ApiError> {
        Ok(Html(self.views.render_note(&note)?).into_response())
    }
}

/// Compiled view templates.
pub struct Views {
    env: Environment<'static>,
}

impl Views {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("index.html", INDEX_TEMPLATE)?;
        env.add_template("note.html", NOTE_TEMPLATE)?;
        Ok(Self { env })
    }

    pub fn render_index(&self) -> Result<String, minijinja::Error> {
        self.env
            .get_template("index.html")?
            .render(context! { version => notes_core::core_version() })
    }

    pub fn render_note(&self, note: &Note) -> Result<String, minijinja::Error> {
        self.env
            .get_template("note.html")?
            .render(context! { note => note })
    }
}
