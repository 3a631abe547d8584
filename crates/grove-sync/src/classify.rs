//! Splitting object ids into commit and tag sets.
//!
//! Both sides of a negotiation name objects by id only; before ancestry can
//! be walked the ids must be resolved against the store. A tag contributes
//! twice: its own id to the tag set and its target to the commit set, so the
//! history behind an annotated release is walked like any other head.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::debug;

use grove_store::{ObjectKind, ObjectStore, Tag};
use grove_types::ObjectId;

use crate::error::{SyncError, SyncResult};
use crate::pool::WorkerPool;

/// Partition `ids` into `(commits, tags)` by reading each from the store.
///
/// With `ignore_unknown` set, ids absent from the store are silently
/// dropped; this is how "have" lines from a peer are treated, since a peer
/// may claim objects this store never received. Without it an unknown id is
/// a [`SyncError::NotFound`]. An id resolving to a blob or tree is a
/// [`SyncError::TypeMismatch`] in either mode.
///
/// Classification runs through the pool; the result is a pair of sets and
/// so independent of completion order.
pub async fn split_commits_and_tags(
    store: &Arc<dyn ObjectStore>,
    ids: impl IntoIterator<Item = ObjectId>,
    ignore_unknown: bool,
    pool: &WorkerPool,
) -> SyncResult<(HashSet<ObjectId>, HashSet<ObjectId>)> {
    let commits = Arc::new(Mutex::new(HashSet::new()));
    let tags = Arc::new(Mutex::new(HashSet::new()));

    let tasks: Vec<_> = ids
        .into_iter()
        .map(|id| {
            let store = Arc::clone(store);
            let commits = Arc::clone(&commits);
            let tags = Arc::clone(&tags);
            async move { classify_one(store.as_ref(), id, ignore_unknown, &commits, &tags) }
        })
        .collect();
    pool.run_batch(tasks).await?;

    let commits = std::mem::take(&mut *commits.lock().expect("lock poisoned"));
    let tags = std::mem::take(&mut *tags.lock().expect("lock poisoned"));
    debug!(
        commits = commits.len(),
        tags = tags.len(),
        ignore_unknown,
        "classified ids"
    );
    Ok((commits, tags))
}

fn classify_one(
    store: &dyn ObjectStore,
    id: ObjectId,
    ignore_unknown: bool,
    commits: &Mutex<HashSet<ObjectId>>,
    tags: &Mutex<HashSet<ObjectId>>,
) -> SyncResult<()> {
    let obj = match store.read(&id)? {
        Some(obj) => obj,
        None if ignore_unknown => return Ok(()),
        None => return Err(SyncError::NotFound(id)),
    };

    match obj.kind {
        ObjectKind::Commit => {
            commits.lock().expect("lock poisoned").insert(id);
        }
        ObjectKind::Tag => {
            let tag = Tag::from_stored_object(&obj)?;
            tags.lock().expect("lock poisoned").insert(id);
            // The target joins the commit frontier unchecked; a tag pointing
            // at a non-commit surfaces later, during the ancestor walk.
            commits.lock().expect("lock poisoned").insert(tag.target);
        }
        actual => return Err(SyncError::TypeMismatch { id, actual }),
    }
    Ok(())
}
