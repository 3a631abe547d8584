//! Error types for commit-graph traversal.

use grove_store::StoreError;
use grove_types::ObjectId;

/// Errors that can occur while walking the commit graph.
#[derive(Debug, thiserror::Error)]
pub enum DagError {
    /// A frontier id or parent reference points to a commit that does not
    /// exist in the store.
    #[error("commit not found: {0}")]
    CommitNotFound(ObjectId),

    /// Store read or decode failure (including ids that resolve to objects
    /// of a non-commit kind).
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience alias for traversal results.
pub type DagResult<T> = Result<T, DagError>;
