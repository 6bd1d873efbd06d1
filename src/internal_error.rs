use log::{error, warn};
use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::Request;
use serde::Serialize;

use std::sync::PoisonError;

#[derive(Debug, thiserror::Error)]
pub enum InternalError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Not signed in: {0}")]
    Unauthorized(String),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Generic internal error: {0}")]
    Generic(String),
}

impl InternalError {
    pub fn status(&self) -> Status {
        match self {
            InternalError::NotFound(_) => Status::NotFound,
            InternalError::InvalidInput(_) => Status::BadRequest,
            InternalError::Conflict(_) => Status::Conflict,
            InternalError::Unauthorized(_) => Status::Unauthorized,
            InternalError::Database(_) | InternalError::Generic(_) => {
                Status::InternalServerError
            }
        }
    }
}

impl<T> From<PoisonError<T>> for InternalError {
    fn from(e: PoisonError<T>) -> InternalError {
        InternalError::Generic(e.to_string())
    }
}

impl From<&str> for InternalError {
    fn from(s: &str) -> InternalError {
        InternalError::Generic(s.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl<'r> Responder<'r, 'static> for InternalError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        if status.code >= 500 {
            error!("{} {}: {}", request.method(), request.uri(), self);
        } else {
            warn!("{} {}: {}", request.method(), request.uri(), self);
        }

        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (status, body).respond_to(request)
    }
}

pub type InternalResult<T> = Result<T, InternalError>;
