use thiserror::Error;

use grove_dag::DagError;
use grove_store::{ObjectKind, StoreError};
use grove_types::ObjectId;

/// Errors from negotiation and retrieval.
///
/// `NotFound` is tolerated only while scanning "haves" (a peer may overclaim
/// what it holds); it is fatal when scanning "wants" or retrieving a body.
/// `TypeMismatch` is always fatal.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An object id required for the negotiation is absent from the store.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// An id expected to resolve to a commit or tag resolved to something else.
    #[error("expected commit or tag, found {actual} for {id}")]
    TypeMismatch { id: ObjectId, actual: ObjectKind },

    /// Ancestor traversal failure.
    #[error(transparent)]
    Dag(#[from] DagError),

    /// Store read or decode failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A pooled worker task panicked or was cancelled.
    #[error("worker task failed: {0}")]
    Worker(String),
}

/// Result alias for negotiation operations.
pub type SyncResult<T> = Result<T, SyncError>;
