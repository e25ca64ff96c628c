//! Single-flight registry for read requests.
//!
//! The first caller for a key becomes the owner: its work is spawned onto
//! the runtime and published as a shared future. Every caller that arrives
//! while the entry exists awaits that same future. The entry is removed when
//! the work finishes, whether it returned or panicked.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use souk_core::{ApiError, ApiResult, InFlightKey};

/// A call whose outcome may be awaited by many callers.
pub type SharedCall = Shared<BoxFuture<'static, ApiResult<String>>>;

struct Entry {
    id: u64,
    call: SharedCall,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: HashMap<InFlightKey, Entry>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes the entry it was created for, unless a newer call replaced it.
struct RemoveOnDrop {
    registry: Arc<Mutex<Registry>>,
    key: InFlightKey,
    id: u64,
}

impl Drop for RemoveOnDrop {
    fn drop(&mut self) {
        let mut registry = lock(&self.registry);
        if registry
            .entries
            .get(&self.key)
            .is_some_and(|entry| entry.id == self.id)
        {
            registry.entries.remove(&self.key);
        }
    }
}

// ============================================================================
// In-Flight Registry
// ============================================================================

/// Map of pending reads keyed by [`InFlightKey`].
///
/// Lookup, registration, and removal share one mutex. The network call runs
/// outside it.
#[derive(Clone, Default)]
pub struct InFlightRegistry {
    inner: Arc<Mutex<Registry>>,
}

impl std::fmt::Debug for InFlightRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InFlightRegistry")
            .field("pending", &self.len())
            .finish()
    }
}

impl InFlightRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins the pending call for `key`, or starts one with `start`.
    ///
    /// Returns the shared call and whether this caller owns it. `start` is
    /// only invoked when no call is pending. Must be called from within a
    /// Tokio runtime.
    pub fn join_or_start<F, Fut>(&self, key: InFlightKey, start: F) -> (SharedCall, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<String>> + Send + 'static,
    {
        let mut registry = lock(&self.inner);
        if let Some(entry) = registry.entries.get(&key) {
            return (entry.call.clone(), false);
        }

        let id = registry.next_id;
        registry.next_id = registry.next_id.wrapping_add(1);

        let guard = RemoveOnDrop {
            registry: Arc::clone(&self.inner),
            key: key.clone(),
            id,
        };
        let work = start();
        let handle = tokio::spawn(async move {
            let _guard = guard;
            work.await
        });

        let call = async move {
            match handle.await {
                Ok(result) => result,
                Err(err) => Err(ApiError::Unknown {
                    message: format!("In-flight request aborted: {err}"),
                    status_code: None,
                    cause: Some(Arc::new(err)),
                }),
            }
        }
        .boxed()
        .shared();

        registry.entries.insert(
            key,
            Entry {
                id,
                call: call.clone(),
            },
        );
        (call, true)
    }

    /// Number of pending calls.
    pub fn len(&self) -> usize {
        lock(&self.inner).entries.len()
    }

    /// Returns true if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use souk_core::HttpMethod;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use url::Url;

    fn key(path: &str) -> InFlightKey {
        let url = Url::parse("https://api.example.com/v1/").unwrap().join(path).unwrap();
        InFlightKey::derive(HttpMethod::Get, &url, true, &[])
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_caller_joins() {
        let registry = InFlightRegistry::new();
        let starts = Arc::new(AtomicU32::new(0));

        let start = |starts: Arc<AtomicU32>| {
            move || {
                starts.fetch_add(1, Ordering::SeqCst);
                async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok("body".to_string())
                }
            }
        };

        let (first, owner_a) = registry.join_or_start(key("me"), start(starts.clone()));
        let (second, owner_b) = registry.join_or_start(key("me"), start(starts.clone()));

        assert!(owner_a);
        assert!(!owner_b);
        assert_eq!(registry.len(), 1);

        let (a, b) = tokio::join!(first, second);
        assert_eq!(a, Ok("body".to_string()));
        assert_eq!(a, b);
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_keys_do_not_share() {
        let registry = InFlightRegistry::new();
        let (_, owner_a) = registry.join_or_start(key("a"), || async { Ok(String::new()) });
        let (_, owner_b) = registry.join_or_start(key("b"), || async { Ok(String::new()) });

        assert!(owner_a && owner_b);
        assert_eq!(registry.len(), 2);
    }

    async fn explode() -> ApiResult<String> {
        panic!("exploded")
    }

    #[tokio::test]
    async fn test_panicking_call_completes_with_failure() {
        let registry = InFlightRegistry::new();
        let (call, _) = registry.join_or_start(key("boom"), explode);
        let (joined, owner) = registry.join_or_start(key("boom"), || async { Ok(String::new()) });
        assert!(!owner);

        let (a, b) = tokio::join!(call, joined);
        assert!(matches!(a, Err(ApiError::Unknown { .. })));
        assert_eq!(a, b);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_entry_removed_after_completion() {
        let registry = InFlightRegistry::new();
        let (call, _) = registry.join_or_start(key("items"), || async { Err(ApiError::Timeout) });
        assert_eq!(call.await, Err(ApiError::Timeout));
        assert!(registry.is_empty());

        let (_, owner) = registry.join_or_start(key("items"), || async { Ok(String::new()) });
        assert!(owner);
    }
}
