use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::login_redirect;
use crate::validation::FormErrors;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(#[from] FormErrors),

    #[error("Authentication required")]
    AuthRequired { next: String },

    #[error("Unique constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("Database error: {0}")]
    DatabaseError(DieselError),

    #[error("Internal server error")]
    InternalError,
}

impl From<DieselError> for ApiError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                ApiError::ConstraintViolation(info.message().to_string())
            }
            DieselError::NotFound => ApiError::NotFound,
            other => ApiError::DatabaseError(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, json!({ "error": self.to_string() })),
            // Invalid input re-renders with the errors and changes nothing.
            ApiError::Validation(errors) => (StatusCode::OK, json!({ "errors": errors })),
            ApiError::AuthRequired { ref next } => {
                return (
                    StatusCode::FOUND,
                    [(header::LOCATION, login_redirect(next))],
                )
                    .into_response();
            }
            ApiError::ConstraintViolation(ref message) => {
                warn!(error = %message, "Unhandled unique constraint violation");
                (StatusCode::CONFLICT, json!({ "error": "Conflict" }))
            }
            ApiError::DatabaseError(ref err) => {
                // Log the detailed error but don't expose it to the client
                error!(error = %err, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
            ApiError::InternalError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": self.to_string() }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
