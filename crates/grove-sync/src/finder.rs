//! Computing the transmit set for one negotiation.
//!
//! A [`MissingObjectFinder`] is built from the peer's "have" and "want" ids
//! and, once constructed, hands out the objects to transmit one at a time.
//! Construction does all the graph work: classification, ancestor closure,
//! the missing/common split, and the tree walk over common commits. Pulling
//! items afterwards is cheap and lock-bounded, so several retrieval workers
//! can share one finder.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::debug;

use grove_dag::AncestorCollector;
use grove_store::{Commit, ObjectStore};
use grove_types::ObjectId;

use crate::classify::split_commits_and_tags;
use crate::error::{SyncError, SyncResult};
use crate::pool::WorkerPool;
use crate::tree_walk::collect_tree_ids;

/// Callback invoked with a human-readable progress line as items are pulled.
pub type ProgressFn = Box<dyn Fn(&str) + Send + Sync>;

/// Deferred supplier of the peeled-tag map (tag id to target id).
///
/// Computing the map can mean scanning every ref, so it is only invoked
/// when a finder is actually constructed with it.
pub type TaggedAccessor = Box<dyn FnOnce() -> HashMap<ObjectId, ObjectId> + Send>;

/// Tuning and hooks for [`MissingObjectFinder::new`].
pub struct FindOptions {
    /// Width of the worker pool used for classification and tree walks.
    pub concurrency: usize,
    /// Optional progress reporter.
    pub progress: Option<ProgressFn>,
    /// Optional supplier of the peeled-tag map.
    pub tagged: Option<TaggedAccessor>,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            progress: None,
            tagged: None,
        }
    }
}

impl fmt::Debug for FindOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FindOptions")
            .field("concurrency", &self.concurrency)
            .field("progress", &self.progress.is_some())
            .field("tagged", &self.tagged.is_some())
            .finish()
    }
}

/// One element of the transmit set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PendingItem {
    /// Id of the object to send.
    pub id: ObjectId,
    /// Path at which the object was reached, when known.
    pub path: Option<String>,
    /// Whether the object is a tree.
    pub is_tree: bool,
}

impl PendingItem {
    /// An item named by id alone, as negotiation heads are.
    pub fn object(id: ObjectId) -> Self {
        Self {
            id,
            path: None,
            is_tree: false,
        }
    }
}

/// Holds the computed transmit set and hands it out item by item.
///
/// Single-use: pull with [`try_next`](Self::try_next) until `None`, then
/// discard the finder.
pub struct MissingObjectFinder {
    to_send: Mutex<Vec<PendingItem>>,
    tagged: HashMap<ObjectId, ObjectId>,
    progress: ProgressFn,
}

impl MissingObjectFinder {
    /// Compute the transmit set for a peer that has `haves` and asks for
    /// `wants`.
    ///
    /// Unknown ids among `haves` are ignored (the peer may overclaim);
    /// unknown ids among `wants` are a [`SyncError::NotFound`]. Commits
    /// reachable from the peer's haves, the full contents of trees behind
    /// commits common to both sides, and tags the peer already holds are
    /// all excluded from the result.
    pub async fn new(
        store: Arc<dyn ObjectStore>,
        haves: HashSet<ObjectId>,
        wants: HashSet<ObjectId>,
        options: FindOptions,
    ) -> SyncResult<Self> {
        let pool = WorkerPool::new(options.concurrency);

        let (have_commits, have_tags) =
            split_commits_and_tags(&store, haves, true, &pool).await?;
        let (want_commits, want_tags) =
            split_commits_and_tags(&store, wants, false, &pool).await?;

        let collector = AncestorCollector::new(store.as_ref());
        let all_ancestors = collector.closure(&have_commits)?;
        let (missing_commits, common_commits) =
            collector.split(&want_commits, &all_ancestors)?;

        // Everything reachable from a common commit is already on the other
        // side; record it so later phases can skip those regions.
        let done = Arc::new(Mutex::new(HashSet::new()));
        let tasks: Vec<_> = common_commits
            .into_iter()
            .map(|commit_id| {
                let store = Arc::clone(&store);
                let done = Arc::clone(&done);
                async move {
                    done.lock().expect("lock poisoned").insert(commit_id);
                    let obj = store
                        .read(&commit_id)?
                        .ok_or(SyncError::NotFound(commit_id))?;
                    let commit = Commit::from_stored_object(&obj)?;
                    collect_tree_ids(store.as_ref(), commit.tree_id, &done)
                }
            })
            .collect();
        pool.run_batch(tasks).await?;

        {
            let mut done = done.lock().expect("lock poisoned");
            done.extend(have_tags.iter().copied());
        }

        let missing_tags: HashSet<ObjectId> =
            want_tags.difference(&have_tags).copied().collect();
        let to_send: Vec<PendingItem> = missing_commits
            .iter()
            .chain(missing_tags.iter())
            .copied()
            .map(PendingItem::object)
            .collect();

        debug!(
            commits = missing_commits.len(),
            tags = missing_tags.len(),
            "computed transmit set"
        );

        Ok(Self {
            to_send: Mutex::new(to_send),
            tagged: options.tagged.map(|supply| supply()).unwrap_or_default(),
            progress: options.progress.unwrap_or_else(|| Box::new(|_| {})),
        })
    }

    /// Pull one item from the transmit set, in unspecified order.
    ///
    /// Reports remaining-count progress after each successful pull. Returns
    /// `None` once the set is exhausted.
    pub fn try_next(&self) -> Option<PendingItem> {
        let (item, remaining) = {
            let mut to_send = self.to_send.lock().expect("lock poisoned");
            (to_send.pop()?, to_send.len())
        };
        (self.progress)(&format!("counting objects: {remaining}"));
        Some(item)
    }

    /// Number of items not yet pulled.
    pub fn pending_count(&self) -> usize {
        self.to_send.lock().expect("lock poisoned").len()
    }

    /// True once every item has been pulled.
    pub fn is_exhausted(&self) -> bool {
        self.pending_count() == 0
    }

    /// The peeled-tag map supplied at construction; empty when none was.
    pub fn tagged_objects(&self) -> &HashMap<ObjectId, ObjectId> {
        &self.tagged
    }
}

impl fmt::Debug for MissingObjectFinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MissingObjectFinder")
            .field("pending", &self.pending_count())
            .field("tagged", &self.tagged.len())
            .finish()
    }
}
