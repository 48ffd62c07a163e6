// ── Generic keyed entity collection ──
//
// Lock-free concurrent storage with O(1) lookups by natural key and by
// numeric surrogate id, plus a `watch` snapshot rebuilt on mutation.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;

/// Entities that carry a numeric surrogate id.
pub(crate) trait Identified {
    fn surrogate_id(&self) -> u64;
}

/// A lock-free collection for a single entity type.
///
/// Writes to one key are atomic: [`upsert_with`](Self::upsert_with) runs
/// its merge closure while holding that key's shard lock, so two writers
/// can never both insert the same key.
pub(crate) struct EntityCollection<K, T>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    T: Identified + Send + Sync + 'static,
{
    /// Primary storage: natural key -> entity.
    by_key: DashMap<K, Arc<T>>,

    /// Secondary index: surrogate id -> natural key.
    id_to_key: DashMap<u64, K>,

    /// Full snapshot, rebuilt on mutation.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<K, T> EntityCollection<K, T>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    T: Identified + Send + Sync + 'static,
{
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_key: DashMap::new(),
            id_to_key: DashMap::new(),
            snapshot,
        }
    }

    /// Insert or replace an entity unconditionally. Returns `true` if the
    /// key was new.
    pub(crate) fn insert(&self, key: K, entity: T) -> bool {
        let id = entity.surrogate_id();
        let previous = self.by_key.insert(key.clone(), Arc::new(entity));
        if let Some(ref old) = previous {
            if old.surrogate_id() != id {
                self.id_to_key.remove(&old.surrogate_id());
            }
        }
        self.id_to_key.insert(id, key);
        self.rebuild_snapshot();
        previous.is_none()
    }

    /// Atomically insert or update the entity stored under `key`.
    ///
    /// `merge` receives the current entity (if any) and returns its
    /// replacement. Returns the stored entity and whether it was new.
    pub(crate) fn upsert_with<F>(&self, key: K, merge: F) -> (Arc<T>, bool)
    where
        F: FnOnce(Option<&T>) -> T,
    {
        let (entity, is_new) = match self.by_key.entry(key.clone()) {
            Entry::Occupied(mut slot) => {
                let next = Arc::new(merge(Some(slot.get().as_ref())));
                slot.insert(Arc::clone(&next));
                (next, false)
            }
            Entry::Vacant(slot) => {
                let next = Arc::new(merge(None));
                slot.insert(Arc::clone(&next));
                (next, true)
            }
        };
        // The shard guard is released here; rebuilding iterates every shard.
        self.id_to_key.insert(entity.surrogate_id(), key);
        self.rebuild_snapshot();
        (entity, is_new)
    }

    /// Replace an existing entity in place. Returns `None` if `key` is absent.
    pub(crate) fn update_with<F>(&self, key: &K, update: F) -> Option<Arc<T>>
    where
        F: FnOnce(&T) -> T,
    {
        let updated = {
            let mut slot = self.by_key.get_mut(key)?;
            let next = Arc::new(update(slot.value().as_ref()));
            *slot.value_mut() = Arc::clone(&next);
            next
        };
        self.rebuild_snapshot();
        Some(updated)
    }

    /// Remove an entity by key. Returns the removed entity if it existed.
    pub(crate) fn remove(&self, key: &K) -> Option<Arc<T>> {
        let removed = self.by_key.remove(key).map(|(_, v)| v);
        if let Some(ref entity) = removed {
            self.id_to_key.remove(&entity.surrogate_id());
            self.rebuild_snapshot();
        }
        removed
    }

    /// Remove an entity by surrogate id.
    pub(crate) fn remove_by_id(&self, id: u64) -> Option<Arc<T>> {
        let (_, key) = self.id_to_key.remove(&id)?;
        let removed = self.by_key.remove(&key).map(|(_, v)| v);
        self.rebuild_snapshot();
        removed
    }

    /// Look up an entity by its natural key.
    pub(crate) fn get_by_key(&self, key: &K) -> Option<Arc<T>> {
        self.by_key.get(key).map(|r| Arc::clone(r.value()))
    }

    /// Look up an entity by its surrogate id (secondary index).
    pub(crate) fn get_by_id(&self, id: u64) -> Option<Arc<T>> {
        let key = self.id_to_key.get(&id)?.value().clone();
        self.by_key.get(&key).map(|r| Arc::clone(r.value()))
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_key.len()
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Collect all values into a snapshot vec and publish it.
    ///
    /// The copy is taken under the channel's write lock, so the last
    /// snapshot published contains every completed write.
    fn rebuild_snapshot(&self) {
        self.snapshot.send_modify(|snap| {
            let mut values: Vec<Arc<T>> =
                self.by_key.iter().map(|r| Arc::clone(r.value())).collect();
            values.sort_by_key(|v| v.surrogate_id());
            *snap = Arc::new(values);
        });
    }
}
