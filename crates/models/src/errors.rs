use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("database error: {0}")]
    Db(String),
}
