//! Settle-once memoization of asynchronous tasks.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};

/// A shared handle to a task's eventual outcome.
///
/// Cloning the handle never restarts the work. Awaiting it after the task has
/// settled yields the stored outcome immediately, including a stored error.
pub type SettledFuture<T> = Shared<BoxFuture<'static, T>>;

/// An explicit memo table from task key to settled-once outcome.
///
/// Created once per process and never cleared. Entries are inserted the first
/// time a key is requested; the outcome type `T` is typically a `Result` whose
/// error is cheap to clone (an `Arc`), so a failure is replayed to every
/// subscriber exactly like a success.
pub struct TaskCache<K, T> {
    entries: Mutex<HashMap<K, SettledFuture<T>>>,
}

impl<K, T> TaskCache<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone + Send + Sync + 'static,
{
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the handle for `key`, creating it with `start` on first use.
    ///
    /// `start` only builds the future; the work runs when a handle is first
    /// polled. The boolean is `true` when this call created the entry.
    pub fn get_or_start<F>(&self, key: &K, start: F) -> (SettledFuture<T>, bool)
    where
        F: FnOnce() -> BoxFuture<'static, T>,
    {
        let mut entries = self.lock();
        if let Some(existing) = entries.get(key) {
            return (existing.clone(), false);
        }
        let settled = start().shared();
        entries.insert(key.clone(), settled.clone());
        (settled, true)
    }

    /// Returns the handle for `key` if the task was ever started.
    pub fn get(&self, key: &K) -> Option<SettledFuture<T>> {
        self.lock().get(key).cloned()
    }

    /// Returns the outcome for `key` if it has already settled.
    pub fn settled(&self, key: &K) -> Option<T> {
        self.lock().get(key).and_then(|f| f.peek().cloned())
    }

    /// Returns `true` if a task for `key` was started.
    pub fn contains(&self, key: &K) -> bool {
        self.lock().contains_key(key)
    }

    /// Number of distinct keys ever started.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if no task was started yet.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, SettledFuture<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K, T> Default for TaskCache<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Wraps `task` so that calls with equal keys share one settled outcome.
///
/// The returned function consults `cache` first and only invokes `task` for a
/// key that was never requested before.
pub fn memoize<K, T, F>(cache: Arc<TaskCache<K, T>>, task: F) -> impl Fn(K) -> SettledFuture<T>
where
    K: Eq + Hash + Clone,
    T: Clone + Send + Sync + 'static,
    F: Fn(&K) -> BoxFuture<'static, T>,
{
    move |key: K| {
        let (settled, started) = cache.get_or_start(&key, || task(&key));
        if !started {
            tracing::trace!("memo hit");
        }
        settled
    }
}
