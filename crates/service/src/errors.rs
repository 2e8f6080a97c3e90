use thiserror::Error;

/// Domain error taxonomy. The HTTP boundary maps each variant to a status;
/// messages are user-facing and must stay free of internals.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("database error: {0}")]
    Db(String),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self {
        Self::NotFound(format!("{} not found!", entity))
    }
}

impl From<models::errors::ModelError> for ServiceError {
    fn from(e: models::errors::ModelError) -> Self {
        use models::errors::ModelError;
        match e {
            ModelError::Validation(msg) => ServiceError::Validation(msg),
            ModelError::InvalidState(msg) => ServiceError::InvalidState(msg),
            ModelError::Db(msg) => ServiceError::Db(msg),
        }
    }
}

impl From<sea_orm::DbErr> for ServiceError {
    fn from(e: sea_orm::DbErr) -> Self {
        ServiceError::Db(e.to_string())
    }
}
