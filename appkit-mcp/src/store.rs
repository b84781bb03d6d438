//! In-memory state store
//!
//! A [`StateStore`] owns the ordered item list a tool family manipulates.
//! It is seeded lazily on first access and lives only as long as the
//! process: nothing is persisted, and a restart (or an explicit
//! [`StateStore::reset`]) brings back the seed set on the next access.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Process-lifetime store of ordered items.
///
/// Every read and every mutation takes the store's lock for its full
/// duration, so a read-modify-write performed inside [`StateStore::mutate`]
/// never interleaves with another one.
#[derive(Debug)]
pub struct StateStore<T> {
    seed: Vec<T>,
    items: Mutex<Option<Vec<T>>>,
}

impl<T: Clone> StateStore<T> {
    /// Create a store that will be initialized with `seed` on first access
    pub fn new(seed: Vec<T>) -> Self {
        Self {
            seed,
            items: Mutex::new(None),
        }
    }

    /// Create a store that starts empty
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Whether the seed set has been materialized yet
    pub fn is_initialized(&self) -> bool {
        self.lock().is_some()
    }

    /// Clone of the current ordered contents
    pub fn snapshot(&self) -> Vec<T> {
        let mut guard = self.lock();
        self.materialize(&mut guard).clone()
    }

    /// Number of items currently held
    pub fn len(&self) -> usize {
        let mut guard = self.lock();
        self.materialize(&mut guard).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `f` against the items under the lock and return its result
    /// together with the post-mutation snapshot.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> (R, Vec<T>) {
        let mut guard = self.lock();
        let items = self.materialize(&mut guard);
        let out = f(items);
        (out, items.clone())
    }

    /// Drop all state. The seed set is restored on the next access.
    pub fn reset(&self) {
        *self.lock() = None;
        tracing::info!("state store reset; seed set restored on next access");
    }

    fn lock(&self) -> MutexGuard<'_, Option<Vec<T>>> {
        // A panicking handler leaves the Vec itself intact, so keep serving it.
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn materialize<'a>(&self, guard: &'a mut MutexGuard<'_, Option<Vec<T>>>) -> &'a mut Vec<T> {
        guard.get_or_insert_with(|| {
            tracing::debug!(items = self.seed.len(), "seeding state store");
            self.seed.clone()
        })
    }
}

/// Generator of opaque, strictly increasing ids.
///
/// Ids are millisecond timestamps, bumped past the previous id when two
/// requests land in the same millisecond (or the clock steps backwards).
#[derive(Debug)]
pub struct IdGenerator {
    last: AtomicI64,
}

impl IdGenerator {
    /// Create a generator whose ids are always greater than `floor`
    pub fn new(floor: i64) -> Self {
        Self {
            last: AtomicI64::new(floor),
        }
    }

    /// Produce the next id
    pub fn next_id(&self) -> String {
        let now = chrono::Utc::now().timestamp_millis();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, candidate, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return candidate.to_string(),
                Err(actual) => prev = actual,
            }
        }
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(0)
    }
}
