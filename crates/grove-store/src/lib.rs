//! Content-addressed object storage for grove.
//!
//! Every piece of data in a grove graph -- blobs, trees, commits, tags -- is
//! an immutable object identified by its BLAKE3 hash (domain-separated by
//! object kind). This crate defines the object model, the [`ObjectStore`]
//! collaborator trait the negotiation layer reads through, and an in-memory
//! backend for tests and embedding.
//!
//! # Object Types
//!
//! - [`Blob`] -- raw content
//! - [`Tree`] -- directory listing mapping names to object references
//! - [`Commit`] -- one graph revision: a root tree plus parent commits
//! - [`Tag`] -- a named reference to another object, one dereference level
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. Concurrent reads are always safe.
//! 3. The store never interprets object contents beyond the kind tag.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod memory;
pub mod object;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryObjectStore;
pub use object::{Blob, Commit, EntryMode, ObjectKind, StoredObject, Tag, Tree, TreeEntry};
pub use traits::ObjectStore;
