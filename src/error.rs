//! Crate-wide error taxonomy

use crate::auth::TokenError;
use crate::storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("username or email already registered")]
    DuplicateIdentity,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("unauthorized: {0}")]
    Unauthorized(#[from] TokenError),

    #[error("note not found")]
    NotFound,

    #[error(transparent)]
    Storage(StorageError),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("token issuing failed: {0}")]
    Issuing(TokenError),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Duplicate(_) => Error::DuplicateIdentity,
            other => Error::Storage(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_storage_error_maps_to_duplicate_identity() {
        let err: Error = StorageError::Duplicate("users_email_key".to_string()).into();
        assert!(matches!(err, Error::DuplicateIdentity));
    }

    #[test]
    fn test_database_error_stays_storage() {
        let err: Error = StorageError::Database("connection refused".to_string()).into();
        assert!(matches!(err, Error::Storage(_)));
        assert_eq!(err.to_string(), "database error: connection refused");
    }

    #[test]
    fn test_token_error_maps_to_unauthorized() {
        let err: Error = TokenError::Expired.into();
        assert!(matches!(err, Error::Unauthorized(TokenError::Expired)));
    }
}
