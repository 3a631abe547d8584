//! Commit-graph traversal for grove.
//!
//! Walks parent edges of commits read from an [`ObjectStore`] to compute
//! ancestor closures and the missing/common split that drives negotiation.
//!
//! [`ObjectStore`]: grove_store::ObjectStore

pub mod ancestors;
pub mod error;

pub use ancestors::AncestorCollector;
pub use error::{DagError, DagResult};
