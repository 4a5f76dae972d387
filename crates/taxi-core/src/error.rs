//! Core error types.

use thiserror::Error;

use crate::forms::FormErrors;

/// Core fleet errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Key decoding error.
    #[error("invalid key format")]
    InvalidKey,

    /// Entity with the given id does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity name.
        entity: &'static str,
        /// Requested id.
        id: u64,
    },

    /// A unique field value is already held by another entity.
    #[error("{entity}.{field} must be unique, '{value}' is taken")]
    UniqueViolation {
        /// Entity name.
        entity: &'static str,
        /// Constrained field.
        field: &'static str,
        /// Conflicting value.
        value: String,
    },

    /// Submitted form data failed validation.
    #[error("invalid form data: {0}")]
    Invalid(FormErrors),

    /// Rows read before a transaction changed before it committed.
    #[error("{entity} {id} changed concurrently")]
    Conflict {
        /// Entity name.
        entity: &'static str,
        /// Id whose rows changed.
        id: u64,
    },
}

impl Error {
    /// Shorthand for a not-found error.
    pub fn not_found(entity: &'static str, id: u64) -> Self {
        Error::NotFound { entity, id }
    }

    /// Whether this error reports a missing entity.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Field errors, when this error reports an invalid form.
    pub fn form_errors(&self) -> Option<&FormErrors> {
        match self {
            Error::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<sled::transaction::TransactionError<Error>> for Error {
    fn from(err: sled::transaction::TransactionError<Error>) -> Self {
        match err {
            sled::transaction::TransactionError::Abort(e) => e,
            sled::transaction::TransactionError::Storage(e) => Error::Storage(e),
        }
    }
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
