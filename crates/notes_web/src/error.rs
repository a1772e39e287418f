//! HTTP error mapping.
//!
//! # Invariants
//! - Missing notes (and malformed ids) answer 404.
//! - Store, render and task failures answer 500 and are logged.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use notes_core::NoteServiceError;
use serde::Serialize;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Storage(String),
    Render(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Storage(_) | Self::Render(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(message) => write!(f, "{message}"),
            Self::Storage(message) => write!(f, "storage error: {message}"),
            Self::Render(message) => write!(f, "render error: {message}"),
            Self::Internal(message) => write!(f, "internal error: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<NoteServiceError> for ApiError {
    fn from(value: NoteServiceError) -> Self {
        match value {
            NoteServiceError::NotFound(id) => Self::NotFound(format!("note not found: {id}")),
            NoteServiceError::Storage(err) => Self::Storage(err.to_string()),
        }
    }
}

impl From<minijinja::Error> for ApiError {
    fn from(value: minijinja::Error) -> Self {
        Self::Render(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(
                "event=http_error module=web status={} error={}",
                status.as_u16(),
                self
            );
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
