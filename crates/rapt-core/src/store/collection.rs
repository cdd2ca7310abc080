// ── Generic reactive collection ──
//
// Concurrent keyed storage with O(1) lookups, a version counter and a
// shared snapshot held in `watch` channels.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

/// A concurrent, reactive collection for a single value type.
///
/// Every mutation call bumps the version counter once and rebuilds the
/// snapshot once, however many keys it touched. Entries are never removed: the bridge keeps the
/// last known state of every device it has seen.
pub(crate) struct EntityCollection<T: Clone + Send + Sync + 'static> {
    /// Device id for devices and records, entity key for entities.
    by_key: DashMap<String, Arc<T>>,

    version: watch::Sender<u64>,

    /// Full snapshot, rebuilt on mutation.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Clone + Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_key: DashMap::new(),
            version,
            snapshot,
        }
    }

    /// Insert or replace a batch of values, publishing one snapshot
    /// afterwards. Returns how many keys were new.
    pub(crate) fn upsert_many(&self, entries: impl IntoIterator<Item = (String, T)>) -> usize {
        let mut touched = false;
        let mut added = 0;
        for (key, value) in entries {
            touched = true;
            if self.by_key.insert(key, Arc::new(value)).is_none() {
                added += 1;
            }
        }
        if touched {
            self.rebuild_snapshot();
            self.bump_version();
        }
        added
    }

    /// Apply `f` to every value, publishing one snapshot afterwards.
    /// Returns how many values `f` reported as changed.
    pub(crate) fn update_all(&self, mut f: impl FnMut(&mut T) -> bool) -> usize {
        let mut changed = 0;
        for mut entry in self.by_key.iter_mut() {
            let mut value = T::clone(entry.value());
            if f(&mut value) {
                *entry.value_mut() = Arc::new(value);
                changed += 1;
            }
        }
        if changed > 0 {
            self.rebuild_snapshot();
            self.bump_version();
        }
        changed
    }

    pub(crate) fn get(&self, key: &str) -> Option<Arc<T>> {
        self.by_key.get(key).map(|r| Arc::clone(r.value()))
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn version(&self) -> u64 {
        *self.version.borrow()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_key.len()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn rebuild_snapshot(&self) {
        let values: Vec<Arc<T>> = self.by_key.iter().map(|r| Arc::clone(r.value())).collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }

    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}
