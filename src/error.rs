use thiserror::Error;

/// Failures reported by a remote store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Network or server error on any request
    #[error("remote request failed: {0}")]
    RequestFailed(String),

    /// A requested sort or column does not exist on the remote relation.
    /// Triggers the reduced fetch instead of surfacing to the user.
    #[error("remote schema unavailable: {0}")]
    SchemaUnavailable(String),
}

/// Failures surfaced to callers of the sync controller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("no user is signed in")]
    NotSignedIn,
}
