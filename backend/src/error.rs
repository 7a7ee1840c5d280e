use rocket::http::Status;
use rocket::response::Responder;
use rocket::serde::json::Json;
use thiserror::Error;
use tracing::error;

use shared::error::ErrorResponse;
use shared::validation::{ValidationError, MAX_OPTIONS, MIN_OPTIONS};
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Options must be between {MIN_OPTIONS} and {MAX_OPTIONS}")]
    InvalidOptionCount,
    #[error("{0}")]
    InvalidInput(String),
    #[error("Invalid option index")]
    InvalidOption,
    #[error("You have already voted on this poll")]
    AlreadyVoted,
    #[error("Invalid poll ID")]
    InvalidId,
    #[error("Poll not found")]
    NotFound,
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Username is already taken")]
    UsernameTaken,
    #[error("Storage unavailable")]
    Unavailable(String),
    #[error("An internal error occurred")]
    Internal(String),
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        if e.is_option_count() {
            ApiError::InvalidOptionCount
        } else {
            ApiError::InvalidInput(e.to_string())
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ApiError::NotFound,
            StoreError::AlreadyVoted => ApiError::AlreadyVoted,
            StoreError::InvalidOption(_) => ApiError::InvalidOption,
            StoreError::UsernameTaken => ApiError::UsernameTaken,
            StoreError::Unavailable(detail) => ApiError::Unavailable(detail),
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for ApiError {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = match &self {
            ApiError::InvalidOptionCount
            | ApiError::InvalidInput(_)
            | ApiError::InvalidOption
            | ApiError::AlreadyVoted
            | ApiError::InvalidId => Status::BadRequest,
            ApiError::NotFound => Status::NotFound,
            ApiError::Unauthenticated | ApiError::InvalidCredentials => Status::Unauthorized,
            ApiError::UsernameTaken => Status::Conflict,
            ApiError::Unavailable(detail) => {
                // Backend details stay in the log, not the response body.
                error!("Storage backend failure: {detail}");
                Status::ServiceUnavailable
            }
            ApiError::Internal(detail) => {
                error!("Internal error: {detail}");
                Status::InternalServerError
            }
        };

        let body = Json(ErrorResponse::new(self.to_string()));
        rocket::Response::build_from(body.respond_to(req)?)
            .status(status)
            .ok()
    }
}
