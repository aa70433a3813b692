use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

use super::storage::Data;
use crate::actions::Action;
use crate::reducers;

/// The single shared mutable resource. State changes only by applying
/// actions; application is serialized behind one lock, in call order.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<Data>,
    subscribers: Mutex<Vec<flume::Sender<Action>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    versions: Mutex<Versions>,
}

/// Latest optimistic version per key. Versions come from one counter, so
/// a released key never hands out a number an older claim still holds.
#[derive(Default)]
struct Versions {
    next: u64,
    latest: im::HashMap<String, u64>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &*lock(&self.inner.state))
            .finish()
    }
}

impl Store {
    pub fn new(state: Data) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                ..Default::default()
            }),
        }
    }

    pub fn dispatch(&self, action: Action) {
        self.batch(vec![action]);
    }

    /// Apply `actions` together. Subscribers and readers never observe a
    /// partially applied batch.
    pub fn batch(&self, actions: Vec<Action>) {
        let mut state = lock(&self.inner.state);
        for action in &actions {
            reducers::reduce(&mut state, action);
        }
        let mut subscribers = lock(&self.inner.subscribers);
        subscribers.retain(|subscriber| {
            actions
                .iter()
                .all(|action| subscriber.send(action.clone()).is_ok())
        });
    }

    /// A snapshot of the current state
    pub fn get_state(&self) -> Data {
        lock(&self.inner.state).clone()
    }

    pub fn with<T>(&self, action: impl FnOnce(&Data) -> T) -> T {
        action(&lock(&self.inner.state))
    }

    /// Receive every action applied from now on, in application order
    pub fn subscribe(&self) -> flume::Receiver<Action> {
        let (sender, receiver) = flume::unbounded();
        lock(&self.inner.subscribers).push(sender);
        receiver
    }

    /// Run `future` in the background. It is awaited by [`Store::settle`].
    ///
    /// Needs a tokio runtime; without one the future is dropped and an
    /// error is logged.
    pub fn spawn(&self, future: impl Future<Output = ()> + Send + 'static) {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                log::error!("Background task dropped, no runtime: {e}");
                return;
            }
        };
        let handle = runtime.spawn(future);
        let mut tasks = lock(&self.inner.tasks);
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }

    /// Wait until every background task, including ones spawned while
    /// waiting, has finished.
    pub async fn settle(&self) {
        loop {
            let handles = std::mem::take(&mut *lock(&self.inner.tasks));
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    log::error!("Background task failed: {e:?}");
                }
            }
        }
    }

    /// Give each key a new optimistic version and return it
    pub(crate) fn claim_versions(&self, keys: &[String]) -> Vec<(String, u64)> {
        let mut versions = lock(&self.inner.versions);
        keys.iter()
            .map(|key| {
                versions.next += 1;
                let version = versions.next;
                versions.latest.insert(key.clone(), version);
                (key.clone(), version)
            })
            .collect()
    }

    /// `true` when no later claim superseded any of `claimed`
    pub(crate) fn is_latest(&self, claimed: &[(String, u64)]) -> bool {
        let versions = lock(&self.inner.versions);
        claimed
            .iter()
            .all(|(key, version)| versions.latest.get(key) == Some(version))
    }

    /// Forget the keys of a finished claim unless a newer one holds them
    pub(crate) fn release_versions(&self, claimed: &[(String, u64)]) {
        let mut versions = lock(&self.inner.versions);
        for (key, version) in claimed {
            if versions.latest.get(key) == Some(version) {
                versions.latest.remove(key);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn tracked_versions(&self) -> usize {
        lock(&self.inner.versions).latest.len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
