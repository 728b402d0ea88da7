pub mod composers;
pub mod customers;
pub mod health;
pub mod persons;
pub mod teams;
pub mod users;

pub use self::health::health;

use crate::{credentials::CredentialError, store::StoreError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

/// Body of every non-document response.
#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub const STORE_FAILURE_MESSAGE: &str = "Database Exception";
pub const SERVER_FAILURE_MESSAGE: &str = "Server Exception";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),
    /// Unknown ids and rejected credentials.
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("unexpected failure: {0}")]
    Internal(String),
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::DuplicateUsername => Self::Unauthorized("Username is already in use"),
            CredentialError::InvalidCredentials => {
                Self::Unauthorized("Invalid username and/or password")
            }
            CredentialError::Store(err) => Self::Store(err),
            CredentialError::Unexpected(message) => Self::Internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    /// Store and internal failures are logged server-side; clients only get a fixed message.
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message),
            Self::Store(err) => {
                error!("Store error: {err}");
                (StatusCode::NOT_IMPLEMENTED, STORE_FAILURE_MESSAGE)
            }
            Self::Internal(err) => {
                error!("Internal error: {err}");
                (StatusCode::INTERNAL_SERVER_ERROR, SERVER_FAILURE_MESSAGE)
            }
        };

        (status, Json(Message::new(message))).into_response()
    }
}

/// Rejection for a missing or malformed JSON body.
pub(crate) const MISSING_PAYLOAD: ApiError = ApiError::BadRequest("Missing payload");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Collection;

    #[test]
    fn credential_errors_map_to_status() {
        let cases = [
            (
                ApiError::from(CredentialError::DuplicateUsername),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::from(CredentialError::InvalidCredentials),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::from(CredentialError::Store(StoreError::NotAnObject)),
                StatusCode::NOT_IMPLEMENTED,
            ),
            (
                ApiError::from(CredentialError::Unexpected("boom".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn store_errors_are_501() {
        let err = ApiError::from(StoreError::Conflict {
            collection: Collection::Users,
            field: "username",
        });
        assert_eq!(err.into_response().status(), StatusCode::NOT_IMPLEMENTED);
    }
}
