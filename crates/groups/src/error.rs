use thiserror::Error;

/// Result type for collaborator calls.
pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

/// Errors surfaced by any collaborator of the group coordinator.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CollaboratorError {
    /// The collaborator could not be reached or failed while serving the call.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    /// The collaborator refused the request.
    #[error("request rejected: {0}")]
    Rejected(String),
}
