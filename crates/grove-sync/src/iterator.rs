//! Concurrent retrieval of the transmit set.
//!
//! An [`ObjectIterator`] wraps one finder and turns pending items into
//! object bodies. Two modes: [`drain`](ObjectIterator::drain) materializes
//! the remaining item list (for counting or batching), and
//! [`into_stream`](ObjectIterator::into_stream) retrieves bodies through
//! the pool and yields them in completion order. Like the finder it wraps,
//! an iterator is single-use.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::debug;

use grove_store::{ObjectStore, StoredObject};

use crate::error::{SyncError, SyncResult};
use crate::finder::{MissingObjectFinder, PendingItem};
use crate::pool::WorkerPool;

/// A retrieved object body paired with the path it was reached at.
pub type RetrievedObject = (StoredObject, Option<String>);

/// Pulls items from a [`MissingObjectFinder`] and retrieves their bodies.
pub struct ObjectIterator {
    store: Arc<dyn ObjectStore>,
    finder: Arc<MissingObjectFinder>,
    items: Vec<PendingItem>,
    pool: WorkerPool,
}

impl ObjectIterator {
    /// Wrap a finder for retrieval at the given pool width.
    ///
    /// `items` seeds the iterator with pre-pulled entries; pass an empty
    /// vec to let the iterator pull everything from the finder itself.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        items: Vec<PendingItem>,
        finder: Arc<MissingObjectFinder>,
        concurrency: usize,
    ) -> Self {
        Self {
            store,
            finder,
            items,
            pool: WorkerPool::new(concurrency),
        }
    }

    /// Pull every remaining item out of the finder into this iterator.
    ///
    /// Pulls run through the pool, matching how retrieval would interleave
    /// with other pullers sharing the finder. Idempotent once the finder is
    /// exhausted; the materialized list is returned on every call.
    pub async fn drain(&mut self) -> SyncResult<&[PendingItem]> {
        loop {
            let outstanding = self.finder.pending_count();
            if outstanding == 0 {
                break;
            }
            let tasks: Vec<_> = (0..outstanding)
                .map(|_| {
                    let finder = Arc::clone(&self.finder);
                    async move { Ok(finder.try_next()) }
                })
                .collect();
            let pulled = self.pool.run_batch(tasks).await?;
            self.items.extend(pulled.into_iter().flatten());
        }
        debug!(items = self.items.len(), "drained transmit set");
        Ok(&self.items)
    }

    /// Total number of items this iterator will yield.
    ///
    /// Drains the finder to count; items are retained and still retrieved
    /// by a later [`into_stream`](Self::into_stream).
    pub async fn pending_count(&mut self) -> SyncResult<usize> {
        Ok(self.drain().await?.len())
    }

    /// Retrieve all bodies through the pool, yielding in completion order.
    ///
    /// The channel is bounded at the pool width, so a slow consumer holds
    /// back retrieval instead of buffering the whole transmit set. A failed
    /// retrieval is yielded as an `Err` element; the stream continues with
    /// the remaining items.
    pub fn into_stream(self) -> mpsc::Receiver<SyncResult<RetrievedObject>> {
        let Self {
            store,
            finder,
            items,
            pool,
        } = self;
        let (tx, rx) = mpsc::channel(pool.size());

        tokio::spawn(async move {
            let mut queued: VecDeque<PendingItem> = items.into();
            let mut inflight = JoinSet::new();
            loop {
                let item = match queued.pop_front() {
                    Some(item) => item,
                    None => match finder.try_next() {
                        Some(item) => item,
                        None => break,
                    },
                };
                let permit = pool.acquire().await;
                let store = Arc::clone(&store);
                let tx = tx.clone();
                inflight.spawn(async move {
                    let _permit = permit;
                    // A closed channel means the receiver hung up; nothing
                    // left to do with the body.
                    let _ = tx.send(retrieve(store.as_ref(), &item)).await;
                });
            }
            while inflight.join_next().await.is_some() {}
        });

        rx
    }
}

fn retrieve(store: &dyn ObjectStore, item: &PendingItem) -> SyncResult<RetrievedObject> {
    let obj = store
        .read(&item.id)?
        .ok_or(SyncError::NotFound(item.id))?;
    Ok((obj, item.path.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use grove_store::{Blob, Commit, EntryMode, InMemoryObjectStore, Tree, TreeEntry};
    use grove_types::ObjectId;

    use crate::finder::FindOptions;

    fn memory_store() -> Arc<dyn ObjectStore> {
        Arc::new(InMemoryObjectStore::new())
    }

    fn put_chain(store: &Arc<dyn ObjectStore>, len: usize) -> Vec<ObjectId> {
        let mut out = Vec::new();
        let mut parents = Vec::new();
        for i in 0..len {
            let blob = store
                .write(&Blob::new(format!("file {i}").into_bytes()).to_stored_object())
                .unwrap();
            let tree = store
                .write(
                    &Tree::new(vec![TreeEntry::new(EntryMode::Regular, "file", blob)])
                        .to_stored_object()
                        .unwrap(),
                )
                .unwrap();
            let commit = Commit {
                tree_id: tree,
                parents: parents.clone(),
                author: "tester <t@example.com>".into(),
                message: format!("c{i}"),
                timestamp: 1_700_000_000,
            };
            let id = store.write(&commit.to_stored_object().unwrap()).unwrap();
            parents = vec![id];
            out.push(id);
        }
        out
    }

    async fn full_finder(
        store: &Arc<dyn ObjectStore>,
        tip: ObjectId,
    ) -> Arc<MissingObjectFinder> {
        Arc::new(
            MissingObjectFinder::new(
                Arc::clone(store),
                HashSet::new(),
                HashSet::from([tip]),
                FindOptions::default(),
            )
            .await
            .unwrap(),
        )
    }

    async fn collect(mut rx: mpsc::Receiver<SyncResult<RetrievedObject>>) -> Vec<SyncResult<RetrievedObject>> {
        let mut out = Vec::new();
        while let Some(result) = rx.recv().await {
            out.push(result);
        }
        out
    }

    #[tokio::test]
    async fn drain_materializes_every_item() {
        let store = memory_store();
        let chain = put_chain(&store, 5);
        let finder = full_finder(&store, *chain.last().unwrap()).await;

        let mut iter = ObjectIterator::new(Arc::clone(&store), Vec::new(), finder, 2);
        let items = iter.drain().await.unwrap();
        let drained: HashSet<ObjectId> = items.iter().map(|item| item.id).collect();
        assert_eq!(drained, chain.iter().copied().collect());
    }

    #[tokio::test]
    async fn drain_is_idempotent() {
        let store = memory_store();
        let chain = put_chain(&store, 3);
        let finder = full_finder(&store, *chain.last().unwrap()).await;

        let mut iter = ObjectIterator::new(Arc::clone(&store), Vec::new(), finder, 2);
        assert_eq!(iter.drain().await.unwrap().len(), 3);
        assert_eq!(iter.drain().await.unwrap().len(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn count_matches_yielded_bodies_at_any_width() {
        let store = memory_store();
        let chain = put_chain(&store, 8);
        let tip = *chain.last().unwrap();

        for width in [1usize, 2, 5] {
            let finder = full_finder(&store, tip).await;
            let mut iter =
                ObjectIterator::new(Arc::clone(&store), Vec::new(), Arc::clone(&finder), width);
            let count = iter.pending_count().await.unwrap();
            assert_eq!(count, chain.len());

            let bodies = collect(iter.into_stream()).await;
            assert_eq!(bodies.len(), count);
            assert!(bodies.iter().all(|r| r.is_ok()));
        }
    }

    #[tokio::test]
    async fn stream_yields_each_body_exactly_once() {
        let store = memory_store();
        let chain = put_chain(&store, 6);
        let finder = full_finder(&store, *chain.last().unwrap()).await;

        let iter = ObjectIterator::new(Arc::clone(&store), Vec::new(), finder, 3);
        let bodies = collect(iter.into_stream()).await;

        let retrieved: HashSet<ObjectId> = bodies
            .into_iter()
            .map(|result| result.unwrap().0.compute_id())
            .collect();
        assert_eq!(retrieved, chain.iter().copied().collect());
    }

    #[tokio::test]
    async fn preseeded_items_are_retrieved_first() {
        let store = memory_store();
        let chain = put_chain(&store, 2);
        let finder = full_finder(&store, *chain.last().unwrap()).await;

        // Pull one item by hand and seed it back in.
        let seed = finder.try_next().unwrap();
        let iter = ObjectIterator::new(Arc::clone(&store), vec![seed.clone()], finder, 1);
        let bodies = collect(iter.into_stream()).await;

        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[0].as_ref().unwrap().0.compute_id(), seed.id);
    }

    #[tokio::test]
    async fn paths_ride_along_with_bodies() {
        let store = memory_store();
        let blob = store
            .write(&Blob::new(b"payload".to_vec()).to_stored_object())
            .unwrap();
        let item = PendingItem {
            id: blob,
            path: Some("src/lib.rs".into()),
            is_tree: false,
        };
        let chain = put_chain(&store, 1);
        let finder = full_finder(&store, chain[0]).await;
        while finder.try_next().is_some() {}

        let iter = ObjectIterator::new(Arc::clone(&store), vec![item], finder, 1);
        let bodies = collect(iter.into_stream()).await;
        assert_eq!(bodies.len(), 1);
        let (obj, path) = bodies.into_iter().next().unwrap().unwrap();
        assert_eq!(obj.data, b"payload");
        assert_eq!(path.as_deref(), Some("src/lib.rs"));
    }

    #[tokio::test]
    async fn missing_body_is_an_error_element_not_a_dead_stream() {
        let store = memory_store();
        let chain = put_chain(&store, 2);
        let finder = full_finder(&store, *chain.last().unwrap()).await;
        while finder.try_next().is_some() {}

        let ghost = ObjectId::hash(b"ghost body");
        let items = vec![
            PendingItem::object(ghost),
            PendingItem::object(chain[0]),
        ];
        let iter = ObjectIterator::new(Arc::clone(&store), items, finder, 1);
        let bodies = collect(iter.into_stream()).await;

        assert_eq!(bodies.len(), 2);
        let errs: Vec<_> = bodies.iter().filter(|r| r.is_err()).collect();
        assert_eq!(errs.len(), 1);
        assert!(matches!(
            errs[0],
            Err(SyncError::NotFound(id)) if *id == ghost
        ));
    }
}
