//! Business-level outcomes with the messages clients are allowed to see.
use thiserror::Error;
use tracing::error;

use crate::repos::RepoError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// Covers both "missing" and "owned by someone else".
    #[error("expense not found or unauthorized")]
    ExpenseNotFound,

    #[error("user already exists")]
    UserExists,

    /// Same message for unknown email and wrong password.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Invalid(String),

    #[error("internal server error")]
    Internal,
}

impl ServiceError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

impl From<RepoError> for ServiceError {
    fn from(e: RepoError) -> Self {
        error!(error = ?e, "store operation failed");
        ServiceError::Internal
    }
}
