use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::services::store::StoreError;

/// Failures that stop the service from starting.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Trip,
    Participant,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Trip => write!(f, "trip"),
            Entity::Participant => write!(f, "participant"),
        }
    }
}

/// Everything a trip operation can be rejected with.
#[derive(Debug, Error)]
pub enum TripError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(Entity),
    #[error("participant already invited")]
    DuplicateParticipant,
    #[error("{0} already confirmed")]
    AlreadyConfirmed(Entity),
    #[error("something went wrong, try again later")]
    Persistence(#[source] StoreError),
}

impl TripError {
    pub fn validation(message: impl Into<String>) -> Self {
        TripError::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            TripError::Validation(_) => StatusCode::BAD_REQUEST,
            TripError::NotFound(_) => StatusCode::NOT_FOUND,
            TripError::DuplicateParticipant | TripError::AlreadyConfirmed(_) => {
                StatusCode::CONFLICT
            }
            TripError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

/// The `{ "message": ... }` envelope every failed request answers with.
pub fn message_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ErrorBody {
        message: message.into(),
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for TripError {
    fn into_response(self) -> Response {
        // Display of Persistence never includes the source.
        message_response(self.status(), self.to_string())
    }
}
