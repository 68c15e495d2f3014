//! Error types for noteleaf.

use thiserror::Error;

/// Result type alias using noteleaf's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for noteleaf operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found. Also returned when a note exists but belongs to
    /// another user, so callers cannot probe for other users' note ids.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input (empty/oversized title, malformed email or status)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Uniqueness conflict (duplicate registration)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal error (failed migrations, corrupt stored data)
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("note 42".to_string());
        assert_eq!(err.to_string(), "Not found: note 42");
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("title must not be empty".to_string());
        assert_eq!(err.to_string(), "Invalid input: title must not be empty");
    }

    #[test]
    fn test_error_display_conflict() {
        let err = Error::Conflict("email already registered".to_string());
        assert_eq!(err.to_string(), "Conflict: email already registered");
    }
}
