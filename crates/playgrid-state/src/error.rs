//! Error types for the credential store.

use thiserror::Error;

/// Result type alias for credential store operations.
pub type StateResult<T> = Result<T, StateError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    /// Entries are write-once; a second put for the same session is refused.
    #[error("credentials already recorded for session: {0}")]
    AlreadyExists(String),
}
