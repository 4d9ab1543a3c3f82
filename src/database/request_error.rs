use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::serde_json::json;

use super::*;

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },
    #[error("field `{field}` is longer than {max} characters")]
    FieldTooLong { field: &'static str, max: usize },
    #[error("malformed request body: {reason}")]
    MalformedBody { reason: String },
    #[error("no game with id {game_id} exists in the database")]
    NoSuchGame { game_id: GameId },
    #[error("database request failed: {0}")]
    Database(#[from] sqlx::Error),
}

impl RequestError {
    pub fn status(&self) -> Status {
        match self {
            Self::MissingField { .. } | Self::FieldTooLong { .. } | Self::MalformedBody { .. } => {
                Status::BadRequest
            }
            Self::NoSuchGame { .. } => Status::NotFound,
            Self::Database(_) => Status::InternalServerError,
        }
    }
}

impl<'r> Responder<'r, 'static> for RequestError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        let message = match &self {
            Self::Database(error) => {
                log::error!("{} {}: {}", request.method(), request.uri(), error);
                status.reason_lossy().to_owned()
            }
            error => {
                log::warn!("{} {} rejected: {}", request.method(), request.uri(), error);
                error.to_string()
            }
        };

        (status, Json(json!({ "error": message }))).respond_to(request)
    }
}

pub type RequestResult<T, E = RequestError> = std::result::Result<T, E>;
