//! Cluster client error types.

use thiserror::Error;

use crate::client::ObjectKind;

pub type ClusterResult<T> = Result<T, ClusterError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClusterError {
    /// The API server refused the object.
    #[error("{kind} {name} rejected ({code} {reason}): {message}")]
    Rejected {
        kind: ObjectKind,
        name: String,
        code: u16,
        reason: String,
        message: String,
    },

    /// The API server could not be reached, or the client could not be built.
    #[error("cluster transport error: {0}")]
    Transport(String),
}

impl ClusterError {
    /// Whether the platform itself answered with a refusal, as opposed to
    /// a transport failure.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ClusterError::Rejected { .. })
    }

    /// Short human-readable cause.
    pub fn reason(&self) -> &str {
        match self {
            ClusterError::Rejected { reason, .. } => reason,
            ClusterError::Transport(detail) => detail,
        }
    }
}
