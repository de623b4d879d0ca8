//! At-most-one concurrent execution per key.
//!
//! The first caller for a key spawns the work as its own task and records a
//! shared handle to its result; later callers for the same key await that
//! handle. The entry is removed when the task settles, on success, error or
//! panic, so the next call after a failure starts fresh. Dropping every
//! waiter does not cancel the task.

use crate::error::{Error, Result};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

type SharedResult<V> = Shared<BoxFuture<'static, Result<V>>>;
type InFlightMap<K, V> = Arc<Mutex<HashMap<K, SharedResult<V>>>>;

/// Concurrent map from key to a shareable in-flight result.
pub struct SingleFlight<K, V> {
    in_flight: InFlightMap<K, V>,
}

impl<K, V> Clone for SingleFlight<K, V> {
    fn clone(&self) -> Self {
        Self {
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<K, V> Default for SingleFlight<K, V> {
    fn default() -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

/// Removes a key from the in-flight map when the owning task ends, however it ends.
struct RemoveOnDrop<K: Eq + Hash, V> {
    map: InFlightMap<K, V>,
    key: Option<K>,
}

impl<K: Eq + Hash, V> Drop for RemoveOnDrop<K, V> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.map.lock().remove(&key);
        }
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` unless an identical key is already running; either way
    /// return that single execution's result.
    pub async fn run<F>(&self, key: K, work: F) -> Result<V>
    where
        F: Future<Output = Result<V>> + Send + 'static,
    {
        let shared = {
            let mut map = self.in_flight.lock();
            if let Some(existing) = map.get(&key) {
                existing.clone()
            } else {
                // The task cannot remove its entry before we insert it: removal
                // needs this lock, which we hold until the insert is done.
                let guard = RemoveOnDrop {
                    map: Arc::clone(&self.in_flight),
                    key: Some(key.clone()),
                };
                let handle = tokio::spawn(async move {
                    let _guard = guard;
                    work.await
                });
                let joined: SharedResult<V> = async move {
                    match handle.await {
                        Ok(result) => result,
                        Err(e) => Err(Error::from(e)),
                    }
                }
                .boxed()
                .shared();
                map.insert(key, joined.clone());
                joined
            }
        };
        shared.await
    }

    /// Number of keys currently executing.
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }

    pub fn is_in_flight(&self, key: &K) -> bool {
        self.in_flight.lock().contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_concurrent_callers_share_one_execution() {
        let flight: SingleFlight<&'static str, u32> = SingleFlight::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let flight = flight.clone();
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                flight
                    .run("k", async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(7)
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(flight.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_failure_is_shared_then_key_is_freed() {
        let flight: SingleFlight<String, u32> = SingleFlight::new();

        let (a, b) = tokio::join!(
            flight.run("k".to_string(), async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Err(Error::ModelNotFound("block/x".into()))
            }),
            flight.run("k".to_string(), async { Ok(1) }),
        );
        assert!(matches!(a, Err(Error::ModelNotFound(_))));
        assert!(matches!(b, Err(Error::ModelNotFound(_))));
        assert!(!flight.is_in_flight(&"k".to_string()));

        let retry = flight.run("k".to_string(), async { Ok(2) }).await.unwrap();
        assert_eq!(retry, 2);
    }

    #[tokio::test]
    async fn test_panic_frees_key() {
        let flight: SingleFlight<u8, u8> = SingleFlight::new();
        let result = flight
            .run(1, async {
                if true {
                    panic!("boom");
                }
                Ok(0)
            })
            .await;
        assert!(matches!(result, Err(Error::Task(_))));
        assert_eq!(flight.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_abandoned_work_still_completes() {
        let flight: SingleFlight<u8, u8> = SingleFlight::new();
        let done = Arc::new(AtomicUsize::new(0));
        let done_in_task = Arc::clone(&done);

        let waiter = flight.run(1, async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            done_in_task.store(1, Ordering::SeqCst);
            Ok(1)
        });
        // Poll once so the task is spawned, then abandon the waiter.
        let _ = tokio::time::timeout(Duration::from_millis(1), waiter).await;

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(done.load(Ordering::SeqCst), 1);
        assert_eq!(flight.in_flight(), 0);
    }
}
