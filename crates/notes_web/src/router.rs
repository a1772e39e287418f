//! Note routes.
//!
//! # Responsibility
//! - Map method + path to exactly one note use-case.
//! - Pick the presenter (JSON or HTML view) from the route shape.
//!
//! # Invariants
//! - `/note/notes` is a reserved literal alias for list/create; `notes` is
//!   never parsed as a note id.
//! - Ids that are not well-formed answer 404, like unknown ids.
//! - Request bodies are read leniently: an unparseable body counts as `{}`.
//! - Store calls run on the blocking pool and never hold an async worker.

use crate::error::ApiError;
use crate::presenter::{HtmlPresenter, JsonPresenter, NotePresenter, Views};
use crate::request_log::log_requests;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::middleware;
use axum::response::{Html, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::debug;
use notes_core::{
    NewNote, Note, NoteId, NoteService, NoteServiceResult, NoteStore, SqliteNoteRepository,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;

pub const DELETED_MESSAGE: &str = "Note Deleted!";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    store: NoteStore,
    views: Arc<Views>,
}

impl AppState {
    /// Binds the router to an opened store and compiles the view templates.
    pub fn new(store: NoteStore) -> Result<Self, minijinja::Error> {
        Ok(Self {
            store,
            views: Arc::new(Views::new()?),
        })
    }
}

/// Builds the note router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/note", get(list_notes).post(create_note))
        .route("/note/notes", get(list_notes).post(create_note))
        .route("/note/:id", get(show_note).delete(delete_note))
        .route("/note/:id/json", get(get_note_json))
        .route("/note/:id/todo", post(attach_todo))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct AttachTodoRequest {
    #[serde(rename = "todoId", default)]
    todo_id: Option<String>,
}

async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    Ok(Html(state.views.render_index()?))
}

async fn list_notes(State(state): State<AppState>) -> Result<Json<Vec<Note>>, ApiError> {
    let notes = with_store(&state, |notes| notes.list_notes()).await?;
    Ok(Json(notes))
}

async fn create_note(State(state): State<AppState>, body: Bytes) -> Result<Json<Note>, ApiError> {
    let new_note: NewNote = lenient_json(&body);
    let note = with_store(&state, move |notes| notes.create_note(&new_note)).await?;
    Ok(Json(note))
}

async fn get_note_json(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    let note = fetch_note(&state, &raw_id).await?;
    JsonPresenter.present(note)
}

async fn show_note(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    let note = fetch_note(&state, &raw_id).await?;
    HtmlPresenter::new(&state.views).present(note)
}

async fn delete_note(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<&'static str, ApiError> {
    let id = parse_note_id(&raw_id)?;
    with_store(&state, move |notes| notes.delete_note(id)).await?;
    Ok(DELETED_MESSAGE)
}

async fn attach_todo(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<Json<Note>, ApiError> {
    let note_id = parse_note_id(&raw_id)?;
    let request: AttachTodoRequest = lenient_json(&body);
    let todo_id = match request.todo_id.as_deref() {
        Some(raw) => parse_note_id(raw)?,
        None => return Err(ApiError::NotFound("todo note not given".to_string())),
    };

    let note = with_store(&state, move |notes| notes.attach_todo(note_id, todo_id)).await?;
    Ok(Json(note))
}

async fn fetch_note(state: &AppState, raw_id: &str) -> Result<Note, ApiError> {
    let id = parse_note_id(raw_id)?;
    with_store(state, move |notes| notes.get_note(id)).await
}

async fn with_store<T>(
    state: &AppState,
    op: impl FnOnce(&mut NoteService<SqliteNoteRepository<'_>>) -> NoteServiceResult<T>
        + Send
        + 'static,
) -> Result<T, ApiError>
where
    T: Send + 'static,
{
    let store = state.store.clone();
    let result = tokio::task::spawn_blocking(move || store.with_notes(op))
        .await
        .map_err(|err| ApiError::Internal(format!("store task failed: {err}")))?;
    Ok(result?)
}

fn parse_note_id(raw: &str) -> Result<NoteId, ApiError> {
    NoteId::parse_str(raw).map_err(|_| ApiError::NotFound(format!("note not found: {raw}")))
}

fn lenient_json<T: DeserializeOwned + Default>(body: &Bytes) -> T {
    if body.is_empty() {
        return T::default();
    }
    serde_json::from_slice(body).unwrap_or_else(|err| {
        debug!("event=request_body module=web status=ignored error={err}");
        T::default()
    })
}
