//! Marking the contents of a known tree as already transferred.
//!
//! When a commit is common to both sides, every blob and subtree its root
//! tree reaches is known to the receiver and must not be retransmitted. The
//! walk records entry ids into a shared done-set and prunes at any entry
//! already present: whoever inserted it first (this walk or a sibling over
//! another common commit) has covered the subtree below it.

use std::collections::HashSet;
use std::sync::Mutex;

use tracing::trace;

use grove_store::{ObjectStore, Tree};
use grove_types::ObjectId;

use crate::error::{SyncError, SyncResult};

/// Record every object id reachable from `tree_id` into `done`.
///
/// The root tree's own id is not inserted; callers account for the commit
/// that references it. Entries already in `done` are not descended into, so
/// overlapping walks over shared subtrees do bounded work.
pub fn collect_tree_ids(
    store: &dyn ObjectStore,
    tree_id: ObjectId,
    done: &Mutex<HashSet<ObjectId>>,
) -> SyncResult<()> {
    let mut stack = vec![tree_id];
    while let Some(id) = stack.pop() {
        let obj = store.read(&id)?.ok_or(SyncError::NotFound(id))?;
        let tree = Tree::from_stored_object(&obj)?;
        trace!(tree = %id, entries = tree.entries.len(), "walking tree");
        for entry in &tree.entries {
            let newly = done.lock().expect("lock poisoned").insert(entry.id);
            if newly && entry.mode.is_tree() {
                stack.push(entry.id);
            }
        }
    }
    Ok(())
}
