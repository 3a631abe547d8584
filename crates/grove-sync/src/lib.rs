//! Missing-object negotiation for grove.
//!
//! Given the set of objects a peer claims to have and the set it wants, this
//! crate computes the minimal set of objects the sender must transmit, then
//! retrieves those objects concurrently through a bounded worker pool.
//!
//! The flow: classify ids into commits and tags ([`split_commits_and_tags`]),
//! compute ancestor closures and the missing/common split (grove-dag), mark
//! tree regions shared with common history as already known
//! ([`collect_tree_ids`]), and hand the resulting transmit set to a
//! [`MissingObjectFinder`]. An [`ObjectIterator`] wraps one finder and yields
//! retrieved object bodies in completion order.
//!
//! Finder and iterator instances are single-use: pull until exhausted, then
//! discard. After a failed call the instance's shared sets are in an
//! unspecified state; reconstruct instead of retrying.

pub mod classify;
pub mod error;
pub mod finder;
pub mod iterator;
pub mod pool;
pub mod tree_walk;

pub use classify::split_commits_and_tags;
pub use error::{SyncError, SyncResult};
pub use finder::{FindOptions, MissingObjectFinder, PendingItem, ProgressFn, TaggedAccessor};
pub use iterator::{ObjectIterator, RetrievedObject};
pub use pool::WorkerPool;
pub use tree_walk::collect_tree_ids;
