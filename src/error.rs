use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::validation::{FilterError, Validator};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("record not found")]
    NotFound,

    #[error("edit conflict")]
    EditConflict,

    #[error(transparent)]
    InvalidFilters(#[from] FilterError),

    #[error("failed validation")]
    FailedValidation(Validator),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("operation timed out")]
    Timeout,

    #[error("database error: {0}")]
    Internal(#[from] sqlx::Error),
}

impl From<Validator> for Error {
    fn from(v: Validator) -> Self {
        Error::FailedValidation(v)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                json!({ "error": "the requested resource could not be found" }),
            ),
            Error::EditConflict => (
                StatusCode::CONFLICT,
                json!({ "error": "unable to update the record due to an edit conflict, please try again" }),
            ),
            Error::InvalidFilters(e) => (StatusCode::BAD_REQUEST, json!({ "error": e.to_string() })),
            Error::FailedValidation(v) => (StatusCode::BAD_REQUEST, json!({ "error": v })),
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            Error::Timeout => {
                tracing::error!("database operation timed out");
                internal()
            }
            Error::Internal(e) => {
                tracing::error!(error = %e, "database error");
                internal()
            }
        };

        (status, Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, serde_json::Value) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": "the server encountered a problem and could not process your request" }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (Error::NotFound, StatusCode::NOT_FOUND),
            (Error::EditConflict, StatusCode::CONFLICT),
            (Error::InvalidFilters(FilterError::SortInvalid), StatusCode::BAD_REQUEST),
            (Error::FailedValidation(Validator::new()), StatusCode::BAD_REQUEST),
            (Error::BadRequest("invalid page number".into()), StatusCode::BAD_REQUEST),
            (Error::Timeout, StatusCode::INTERNAL_SERVER_ERROR),
            (Error::Internal(sqlx::Error::PoolTimedOut), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn internal_details_are_not_leaked() {
        let response = Error::Internal(sqlx::Error::Protocol("secret".into())).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(!String::from_utf8_lossy(&body).contains("secret"));
    }
}
