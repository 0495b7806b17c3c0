//! Mapping of crate errors onto HTTP responses

use crate::error::Error;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// JSON body of every error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug)]
pub enum ApiError {
    Domain(Error),
    /// Malformed request body or path
    BadRequest(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::Domain(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Domain(err) => match err {
                Error::DuplicateIdentity => StatusCode::CONFLICT,
                Error::InvalidCredentials => StatusCode::BAD_REQUEST,
                Error::Unauthorized(_) => StatusCode::FORBIDDEN,
                Error::NotFound => StatusCode::NOT_FOUND,
                Error::Storage(_) | Error::Hashing(_) | Error::Issuing(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// Client-facing message; internal details stay in the logs
    fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Domain(err) => match err {
                Error::DuplicateIdentity => "Username or email already registered".to_string(),
                Error::InvalidCredentials => "Invalid credentials".to_string(),
                Error::Unauthorized(_) => "Forbidden".to_string(),
                Error::NotFound => "Note not found".to_string(),
                Error::Storage(_) => "Database error".to_string(),
                Error::Hashing(_) | Error::Issuing(_) => "Internal error".to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Domain(
                err @ (Error::Storage(_) | Error::Hashing(_) | Error::Issuing(_)),
            ) => {
                error!(error = %err, "Request failed");
            }
            other => debug!(status = %status, error = ?other, "Request rejected"),
        }

        let body = ErrorBody {
            error: self.message(),
        };
        (status, Json(body)).into_response()
    }
}
