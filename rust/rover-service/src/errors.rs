use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rover_core::{CompileError, PathError};
use serde::Serialize;
use thiserror::Error;

use crate::session::AppendError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<PathError> for AppError {
    fn from(e: PathError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<CompileError> for AppError {
    fn from(e: CompileError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<AppendError> for AppError {
    fn from(e: AppendError) -> Self {
        match e {
            AppendError::Rejected(e) => e.into(),
            AppendError::Internal(e) => AppError::Internal(e),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorPayload<'a>,
}

#[derive(Serialize)]
struct ErrorPayload<'a> {
    code: &'a str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            AppError::Internal(e) => {
                tracing::error!(error = %e, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", e.to_string())
            }
        };
        (status, Json(ErrorBody { error: ErrorPayload { code, message } })).into_response()
    }
}
