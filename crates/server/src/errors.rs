use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use service::auth::errors::AuthError;
use service::errors::ServiceError;

/// Boundary error: one variant per taxonomy member, mapped to a status and
/// a plain-text message. Anything unexpected collapses to 500 with no
/// detail leaked.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn unauthenticated() -> Self {
        Self::Unauthenticated("Please log in to proceed.".into())
    }

    pub fn forbidden() -> Self {
        Self::Forbidden("Access denied!".into())
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(msg) | ServiceError::InvalidState(msg) => {
                ApiError::Validation(msg)
            }
            ServiceError::Conflict(msg) => ApiError::Conflict(msg),
            ServiceError::NotFound(msg) => ApiError::NotFound(msg),
            ServiceError::Db(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(msg) => ApiError::Validation(msg),
            AuthError::Conflict => ApiError::Conflict(e.to_string()),
            AuthError::NotFound => ApiError::NotFound(e.to_string()),
            AuthError::Unauthorized => ApiError::Unauthenticated(e.to_string()),
            AuthError::HashError(msg) | AuthError::TokenError(msg) | AuthError::Repository(msg) => {
                ApiError::Internal(msg)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Internal(msg) => {
                error!(error = %msg, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };
        (status, msg).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_conventional_statuses() {
        let cases = [
            (ApiError::Validation("v".into()), StatusCode::BAD_REQUEST),
            (ApiError::Conflict("c".into()), StatusCode::CONFLICT),
            (ApiError::NotFound("n".into()), StatusCode::NOT_FOUND),
            (ApiError::unauthenticated(), StatusCode::UNAUTHORIZED),
            (ApiError::forbidden(), StatusCode::FORBIDDEN),
            (ApiError::Internal("secret detail".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn invalid_state_is_a_bad_request() {
        let err: ApiError = ServiceError::InvalidState("Unable to change the status from APPROVED".into()).into();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn db_errors_never_leak_detail() {
        let err: ApiError = ServiceError::Db("connection string with password".into()).into();
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
