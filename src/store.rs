use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

use tracing::debug;

type Observer = Arc<Mutex<Box<dyn FnMut(i64) + Send>>>;

#[derive(Default)]
struct Observers {
    next_id: u64,
    list: Vec<(u64, Observer)>,
}

/// The counter cell plus its observers.
///
/// Observers run synchronously on the mutating thread, after the new value
/// is stored. They must not mutate the store themselves.
///
/// A mutation and its notification happen under `write`, so observers see
/// values in the order they were applied and the last one they see is
/// always the current value.
#[derive(Default)]
pub struct CounterStore {
    write: Mutex<()>,
    value: Mutex<i64>,
    observers: Arc<Mutex<Observers>>,
}

impl CounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> i64 {
        *lock(&self.value)
    }

    pub fn set(&self, n: i64) {
        let _write = lock(&self.write);
        *lock(&self.value) = n;
        debug!(value = n, "counter set");
        self.notify(n);
    }

    pub fn increment(&self, n: i64) {
        let _write = lock(&self.write);
        let next = {
            let mut v = lock(&self.value);
            *v = v.saturating_add(n);
            *v
        };
        debug!(by = n, value = next, "counter incremented");
        self.notify(next);
    }

    /// Register `f` to be called with the new value after every mutation.
    /// The observer stays registered until the returned guard is dropped.
    pub fn subscribe<F>(&self, f: F) -> Subscription
    where
        F: FnMut(i64) + Send + 'static,
    {
        let mut obs = lock(&self.observers);
        obs.next_id = obs.next_id.wrapping_add(1);
        let id = obs.next_id;
        let f: Box<dyn FnMut(i64) + Send> = Box::new(f);
        obs.list.push((id, Arc::new(Mutex::new(f))));
        Subscription { id, observers: Arc::downgrade(&self.observers) }
    }

    /// Narrow facade exposing only the two mutations.
    pub fn handle(&self) -> CounterHandle<'_> {
        CounterHandle { store: self }
    }

    fn notify(&self, value: i64) {
        // Snapshot so observers can (un)subscribe while being called.
        let snapshot: Vec<Observer> = lock(&self.observers)
            .list
            .iter()
            .map(|(_, o)| Arc::clone(o))
            .collect();
        for o in snapshot {
            let mut f = lock(&o);
            (*f)(value);
        }
    }
}

/// Unsubscribes on drop.
pub struct Subscription {
    id: u64,
    observers: Weak<Mutex<Observers>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(observers) = self.observers.upgrade() {
            lock(&observers).list.retain(|(id, _)| *id != self.id);
        }
    }
}

/// What code outside the display gets to drive the counter with.
#[derive(Clone, Copy)]
pub struct CounterHandle<'a> {
    store: &'a CounterStore,
}

impl CounterHandle<'_> {
    pub fn increment(&self, n: i64) {
        self.store.increment(n);
    }

    pub fn set(&self, n: i64) {
        self.store.set(n);
    }
}

static STORE: OnceLock<CounterStore> = OnceLock::new();

/// The process-wide store. Displays subscribe here.
pub fn global() -> &'static CounterStore {
    STORE.get_or_init(CounterStore::new)
}

/// Globally reachable handle for callers outside the rendering layer.
pub fn counter() -> CounterHandle<'static> {
    global().handle()
}

fn lock<T: ?Sized>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
