//! Ancestor closures and the missing/common split.
//!
//! # Invariants
//!
//! - The commit graph is acyclic; traversal terminates on any finite DAG,
//!   merge commits included.
//! - Results are sets: deterministic for identical inputs regardless of
//!   internal traversal order.

use std::collections::{HashSet, VecDeque};

use tracing::debug;

use grove_store::{Commit, ObjectStore};
use grove_types::ObjectId;

use crate::error::{DagError, DagResult};

/// Walks parent edges of commits read from an object store.
///
/// Constructed per negotiation; holds no state between calls.
pub struct AncestorCollector<'a> {
    store: &'a dyn ObjectStore,
}

impl<'a> AncestorCollector<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self { store }
    }

    /// All commits transitively reachable via parent edges from the
    /// frontier, the frontier itself included.
    pub fn closure(&self, frontier: &HashSet<ObjectId>) -> DagResult<HashSet<ObjectId>> {
        let (reachable, _) = self.split(frontier, &HashSet::new())?;
        Ok(reachable)
    }

    /// Partition the walk from `frontier` against an excluded closure.
    ///
    /// BFS from the frontier: a commit found in `exclude` is recorded as
    /// `common` and its parents are not followed; every other reached commit
    /// lands in `missing` and the walk continues through its parents. With an
    /// empty `exclude` this degenerates to [`closure`](Self::closure).
    pub fn split(
        &self,
        frontier: &HashSet<ObjectId>,
        exclude: &HashSet<ObjectId>,
    ) -> DagResult<(HashSet<ObjectId>, HashSet<ObjectId>)> {
        let mut missing = HashSet::new();
        let mut common = HashSet::new();
        let mut queue: VecDeque<ObjectId> = frontier.iter().copied().collect();

        while let Some(id) = queue.pop_front() {
            if exclude.contains(&id) {
                common.insert(id);
            } else if missing.insert(id) {
                let commit = self.read_commit(&id)?;
                queue.extend(commit.parents);
            }
        }

        debug!(
            frontier = frontier.len(),
            missing = missing.len(),
            common = common.len(),
            "ancestor split"
        );
        Ok((missing, common))
    }

    fn read_commit(&self, id: &ObjectId) -> DagResult<Commit> {
        let obj = self
            .store
            .read(id)?
            .ok_or(DagError::CommitNotFound(*id))?;
        Ok(Commit::from_stored_object(&obj)?)
    }
}
