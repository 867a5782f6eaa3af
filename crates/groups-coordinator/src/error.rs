//! Error types for the group coordinator

use proven_groups::CollaboratorError;
use thiserror::Error;

/// Result type for group operations
pub type GroupResult<T> = Result<T, Error>;

/// Errors returned by the group coordinator
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or contradictory caller input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Referenced group or namespace does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The operation would violate a group invariant
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Another move is already in flight for the same server
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A collaborator failed; propagated unchanged
    #[error(transparent)]
    Unavailable(#[from] CollaboratorError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`Error::InvalidArgument`]
    InvalidArgument,
    /// See [`Error::NotFound`]
    NotFound,
    /// See [`Error::InvalidState`]
    InvalidState,
    /// See [`Error::Conflict`]
    Conflict,
    /// See [`Error::Unavailable`]
    Unavailable,
    /// See [`Error::Internal`]
    Internal,
}

impl Error {
    /// Get error kind
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Unavailable(_) => ErrorKind::Unavailable,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}
