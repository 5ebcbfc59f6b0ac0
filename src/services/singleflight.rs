//! Keyed coalescing of duplicate in-flight work.
//!
//! Concurrent calls with the same key share one execution: the first
//! caller's future runs, everyone else awaits the same shared future and
//! receives a clone of its result, success or failure. The map lock is
//! held only to insert or remove entries; the work itself runs unlocked.

use crate::infra::error::{StubError, StubResult};
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

type SharedWork<T> = Shared<BoxFuture<'static, StubResult<T>>>;

pub struct SingleFlight<T: Clone> {
    inflight: Mutex<HashMap<String, SharedWork<T>>>,
}

impl<T: Clone + Send + Sync + 'static> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> SingleFlight<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Run `work` under `key`, joining an execution already in flight for
    /// the same key instead of starting another.
    ///
    /// The work is spawned as its own task: a waiter that goes away does
    /// not abort it, so the result still lands in whatever cache the work
    /// populates.
    pub async fn run<F>(&self, key: &str, work: F) -> StubResult<T>
    where
        F: Future<Output = StubResult<T>> + Send + 'static,
    {
        let shared = {
            let mut inflight = self.inflight.lock().expect("singleflight mutex poisoned");
            match inflight.get(key) {
                Some(existing) => existing.clone(),
                None => {
                    let handle = tokio::spawn(work);
                    let shared = async move {
                        match handle.await {
                            Ok(result) => result,
                            Err(e) => {
                                Err(StubError::Internal(format!("coalesced task failed: {e}")))
                            }
                        }
                    }
                    .boxed()
                    .shared();
                    inflight.insert(key.to_string(), shared.clone());
                    shared
                }
            }
        };

        let result = shared.clone().await;

        // Drop the entry once settled, but only if it is still ours; a new
        // flight for the same key may already have replaced it.
        let mut inflight = self.inflight.lock().expect("singleflight mutex poisoned");
        if let Some(current) = inflight.get(key) {
            if Shared::ptr_eq(current, &shared) {
                inflight.remove(key);
            }
        }

        result
    }

    /// Number of keys currently in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inflight
            .lock()
            .expect("singleflight mutex poisoned")
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
