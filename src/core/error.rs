//! Error type shared by the lifecycle engine and its stores

use miette::Diagnostic;
use thiserror::Error;

use crate::core::identity::IdParseError;

/// Result alias used throughout the engine
pub type QualityResult<T> = Result<T, QualityError>;

/// Errors raised by lifecycle operations
///
/// Only `NotFound` and `BadRequest` come out of the state machines themselves.
/// The remaining variants belong to the storage and input layers.
#[derive(Debug, Error, Diagnostic)]
pub enum QualityError {
    /// Entity absent, or present under a different tenant
    #[error("{kind} {id} not found")]
    #[diagnostic(code(qms::not_found))]
    NotFound { kind: &'static str, id: String },

    /// A guard on the current state rejected the operation
    #[error("{0}")]
    #[diagnostic(code(qms::bad_request))]
    BadRequest(String),

    #[error("storage error: {0}")]
    #[diagnostic(code(qms::storage), help("check that the .qms/quality.db file is readable and writable"))]
    Storage(String),

    #[error("serialization error: {0}")]
    #[diagnostic(code(qms::serialization))]
    Serialization(String),

    #[error("invalid input: {0}")]
    #[diagnostic(code(qms::invalid_input))]
    InvalidInput(String),
}

impl QualityError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        QualityError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        QualityError::BadRequest(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, QualityError::NotFound { .. })
    }

    pub fn is_bad_request(&self) -> bool {
        matches!(self, QualityError::BadRequest(_))
    }

    /// HTTP status an API layer would map this error to
    pub fn status_code(&self) -> u16 {
        match self {
            QualityError::NotFound { .. } => 404,
            QualityError::BadRequest(_) | QualityError::InvalidInput(_) => 400,
            QualityError::Storage(_) | QualityError::Serialization(_) => 500,
        }
    }
}

impl From<rusqlite::Error> for QualityError {
    fn from(err: rusqlite::Error) -> Self {
        QualityError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for QualityError {
    fn from(err: serde_json::Error) -> Self {
        QualityError::Serialization(err.to_string())
    }
}

impl From<IdParseError> for QualityError {
    fn from(err: IdParseError) -> Self {
        QualityError::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(QualityError::not_found("NCR", "x").status_code(), 404);
        assert_eq!(QualityError::bad_request("nope").status_code(), 400);
        assert_eq!(QualityError::Storage("disk".into()).status_code(), 500);
    }

    #[test]
    fn test_not_found_message() {
        let err = QualityError::not_found("CAPA", "CAPA-123");
        assert_eq!(err.to_string(), "CAPA CAPA-123 not found");
        assert!(err.is_not_found());
        assert!(!err.is_bad_request());
    }
}
