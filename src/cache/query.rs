//! Interval-polled query with per-key caching.

use std::collections::{HashMap, VecDeque};
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::BoxFuture;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::state::{Phase, QueryState};
use crate::api::ApiError;

/// Future returned by a [`Fetcher`].
pub type FetchFuture<T> = BoxFuture<'static, Result<T, ApiError>>;

/// Produces the fetch for a given parameter key.
pub type Fetcher<K, T> = Arc<dyn Fn(K) -> FetchFuture<T> + Send + Sync>;

/// Default refetch interval for monitor lists, stats and history.
pub const DEFAULT_REFETCH_INTERVAL: Duration = Duration::from_millis(30_000);

/// Keys whose data is kept per query, current key included.
pub const MAX_CACHED_KEYS: usize = 8;

/// A fetch result tagged with the key it was dispatched for.
struct Resolved<K, T> {
    key: K,
    result: Result<T, ApiError>,
}

/// A polled query keyed by its parameters.
///
/// Each fetch is spawned on the tokio runtime and reports back through a
/// channel, so the caller (the UI loop) never blocks. Call [`Query::tick`]
/// on every loop iteration: it applies whatever has resolved since the
/// last call and dispatches a refetch once the interval has elapsed,
/// whether or not the previous attempt succeeded.
///
/// Responses are matched by key, not arrival order. A response for a key
/// that is no longer current is dropped; responses for the current key are
/// applied in the order they resolve.
///
/// Data is cached for the [`MAX_CACHED_KEYS`] most recently used keys, so
/// switching back to a recent key shows its data at once. Older entries
/// are dropped.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use probewatch::api::ApiError;
/// use probewatch::cache::{FetchFuture, Fetcher, Query};
///
/// # tokio_test::block_on(async {
/// let fetcher: Fetcher<String, Vec<u32>> = Arc::new(|name: String| -> FetchFuture<Vec<u32>> {
///     Box::pin(async move { Ok::<_, ApiError>(vec![name.len() as u32]) })
/// });
///
/// let mut query = Query::new(
///     "lengths",
///     fetcher,
///     Duration::from_secs(30),
///     tokio::runtime::Handle::current(),
/// );
/// assert!(!query.is_enabled());
///
/// query.set_key(Some("api".to_string()));
/// query.tick();
/// # });
/// ```
pub struct Query<K, T> {
    name: &'static str,
    key: Option<K>,
    entries: HashMap<K, QueryState<T>>,
    /// Cached keys, least recently used first.
    recent: VecDeque<K>,
    idle: QueryState<T>,
    fetcher: Fetcher<K, T>,
    interval: Duration,
    runtime: Handle,
    tx: mpsc::UnboundedSender<Resolved<K, T>>,
    rx: mpsc::UnboundedReceiver<Resolved<K, T>>,
    last_dispatch: Option<Instant>,
}

impl<K, T> Query<K, T>
where
    K: Clone + Eq + Hash + Debug + Send + 'static,
    T: Default + Send + 'static,
{
    /// Create a disabled query. Call [`Query::set_key`] to enable it.
    pub fn new(
        name: &'static str,
        fetcher: Fetcher<K, T>,
        interval: Duration,
        runtime: Handle,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            name,
            key: None,
            entries: HashMap::new(),
            recent: VecDeque::new(),
            idle: QueryState::default(),
            fetcher,
            interval,
            runtime,
            tx,
            rx,
            last_dispatch: None,
        }
    }

    /// Create a query that is enabled with `key` from the start.
    pub fn with_key(
        name: &'static str,
        key: K,
        fetcher: Fetcher<K, T>,
        interval: Duration,
        runtime: Handle,
    ) -> Self {
        let mut query = Self::new(name, fetcher, interval, runtime);
        query.key = Some(key);
        query
    }

    /// Current parameters, or `None` while disabled.
    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.key.is_some()
    }

    /// State for the current key.
    ///
    /// A disabled query, or a key that has never been dispatched, reports
    /// an `Idle` state with default data.
    pub fn state(&self) -> &QueryState<T> {
        self.key
            .as_ref()
            .and_then(|key| self.entries.get(key))
            .unwrap_or(&self.idle)
    }

    /// Shorthand for the current key's data.
    pub fn data(&self) -> &T {
        &self.state().data
    }

    /// Switch to new parameters.
    ///
    /// Data cached for `key` (if it was current before) is visible
    /// immediately; a fetch is dispatched on the next tick. In-flight
    /// responses for the previous key will be discarded when they arrive.
    /// Returns whether the key changed.
    pub fn set_key(&mut self, key: Option<K>) -> bool {
        if self.key == key {
            return false;
        }
        debug!(query = self.name, ?key, "query key changed");
        if let Some(key) = &key {
            self.touch(key);
        }
        self.key = key;
        self.last_dispatch = None;
        true
    }

    /// Number of keys with cached state.
    pub fn cached_keys(&self) -> usize {
        self.entries.len()
    }

    /// Mark `key` as most recently used and evict past the cap.
    fn touch(&mut self, key: &K) {
        if let Some(pos) = self.recent.iter().position(|k| k == key) {
            self.recent.remove(pos);
        }
        self.recent.push_back(key.clone());

        while self.recent.len() > MAX_CACHED_KEYS {
            if let Some(evicted) = self.recent.pop_front() {
                debug!(query = self.name, key = ?evicted, "evicting cached entry");
                self.entries.remove(&evicted);
            }
        }
    }

    /// Dispatch a fetch on the next tick regardless of the interval.
    pub fn refetch(&mut self) {
        self.last_dispatch = None;
    }

    /// Apply resolved responses, then dispatch if a refetch is due.
    ///
    /// Returns true if the visible state changed.
    pub fn tick(&mut self) -> bool {
        let mut changed = self.poll();

        if let Some(key) = self.key.clone() {
            let due = self
                .last_dispatch
                .map_or(true, |at| at.elapsed() >= self.interval);
            if due {
                self.dispatch(key);
                changed = true;
            }
        }

        changed
    }

    /// Apply every response that has resolved so far without dispatching.
    ///
    /// Returns true if the visible state changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;

        while let Ok(resolved) = self.rx.try_recv() {
            if self.key.as_ref() != Some(&resolved.key) {
                debug!(query = self.name, key = ?resolved.key, "discarding superseded response");
                continue;
            }
            self.apply(resolved);
            changed = true;
        }

        changed
    }

    fn apply(&mut self, resolved: Resolved<K, T>) {
        let entry = self.entries.entry(resolved.key.clone()).or_default();
        match resolved.result {
            Ok(data) => {
                debug!(query = self.name, key = ?resolved.key, "fetch succeeded");
                entry.data = data;
                entry.phase = Phase::Ready;
                entry.error = None;
                entry.updated_at = Some(Instant::now());
            }
            Err(e) => {
                warn!(query = self.name, key = ?resolved.key, error = %e, "fetch failed");
                entry.phase = Phase::Error;
                entry.error = Some(e.to_string());
            }
        }
    }

    fn dispatch(&mut self, key: K) {
        debug!(query = self.name, ?key, "dispatching fetch");
        self.touch(&key);
        self.entries.entry(key.clone()).or_default().phase = Phase::Loading;
        self.last_dispatch = Some(Instant::now());

        let fetch = (self.fetcher)(key.clone());
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = fetch.await;
            // Receiver gone means the query was dropped
            let _ = tx.send(Resolved { key, result });
        });
    }
}

impl<K, T> Debug for Query<K, T>
where
    K: Clone + Eq + Hash + Debug + Send + 'static,
    T: Default + Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("interval", &self.interval)
            .field("cached_keys", &self.cached_keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    type Pending = Arc<Mutex<Vec<(String, oneshot::Sender<Result<Vec<u32>, ApiError>>)>>>;

    /// Fetcher whose responses are released by the test, in any order.
    fn gated() -> (Fetcher<String, Vec<u32>>, Pending) {
        let pending: Pending = Arc::new(Mutex::new(Vec::new()));
        let handle = pending.clone();
        let fetcher: Fetcher<String, Vec<u32>> = Arc::new(move |key: String| -> FetchFuture<Vec<u32>> {
            let (tx, rx) = oneshot::channel();
            handle.lock().unwrap().push((key, tx));
            Box::pin(async move {
                rx.await
                    .unwrap_or_else(|_| Err(ApiError::Connection("dropped".to_string())))
            })
        });
        (fetcher, pending)
    }

    fn release(pending: &Pending, index: usize, result: Result<Vec<u32>, ApiError>) {
        let (_, tx) = pending.lock().unwrap().remove(index);
        tx.send(result).unwrap();
    }

    fn dispatched(pending: &Pending) -> Vec<String> {
        pending.lock().unwrap().iter().map(|(k, _)| k.clone()).collect()
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    async fn settle_briefly() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    fn query(fetcher: Fetcher<String, Vec<u32>>, interval: Duration) -> Query<String, Vec<u32>> {
        Query::new("test", fetcher, interval, Handle::current())
    }

    #[tokio::test]
    async fn test_disabled_query_never_fetches() {
        let (fetcher, pending) = gated();
        let mut q = query(fetcher, Duration::ZERO);

        assert!(!q.tick());
        assert!(!q.tick());
        settle().await;

        assert!(dispatched(&pending).is_empty());
        assert_eq!(q.state().phase, Phase::Idle);
        assert!(q.data().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_lifecycle() {
        let (fetcher, pending) = gated();
        let mut q = query(fetcher, Duration::from_secs(3600));
        q.set_key(Some("a".to_string()));

        assert!(q.tick());
        assert_eq!(q.state().phase, Phase::Loading);
        assert!(q.state().is_initial_load());

        release(&pending, 0, Ok(vec![1, 2, 3]));
        settle().await;

        assert!(q.tick());
        assert_eq!(q.state().phase, Phase::Ready);
        assert_eq!(q.data(), &vec![1, 2, 3]);
        assert!(q.state().has_data());

        // Interval not elapsed, nothing dispatched
        assert!(!q.tick());
        assert!(dispatched(&pending).is_empty());
    }

    #[tokio::test]
    async fn test_refetch_dispatches_immediately() {
        let (fetcher, pending) = gated();
        let mut q = query(fetcher, Duration::from_secs(3600));
        q.set_key(Some("a".to_string()));
        q.tick();
        release(&pending, 0, Ok(vec![1]));
        settle().await;
        q.tick();

        q.refetch();
        q.tick();
        assert_eq!(dispatched(&pending), vec!["a".to_string()]);
        // Data is kept while reloading
        assert_eq!(q.state().phase, Phase::Loading);
        assert_eq!(q.data(), &vec![1]);
    }

    #[tokio::test]
    async fn test_superseded_key_response_is_discarded() {
        let (fetcher, pending) = gated();
        let mut q = query(fetcher, Duration::from_secs(3600));

        q.set_key(Some("5m".to_string()));
        q.tick();
        q.set_key(Some("1h".to_string()));
        q.tick();
        assert_eq!(dispatched(&pending), vec!["5m".to_string(), "1h".to_string()]);

        // New key resolves first, then the stale one arrives late
        release(&pending, 1, Ok(vec![60]));
        settle().await;
        q.tick();
        release(&pending, 0, Ok(vec![5]));
        settle().await;
        q.tick();

        assert_eq!(q.data(), &vec![60]);

        // The stale response was never stored under its own key either
        q.set_key(Some("5m".to_string()));
        assert!(!q.state().has_data());
    }

    #[tokio::test]
    async fn test_latest_resolution_wins_for_same_key() {
        let (fetcher, pending) = gated();
        let mut q = query(fetcher, Duration::from_secs(3600));
        q.set_key(Some("a".to_string()));
        q.tick();
        q.refetch();
        q.tick();
        assert_eq!(dispatched(&pending).len(), 2);

        // Second dispatch resolves first, first dispatch resolves last
        release(&pending, 1, Ok(vec![2]));
        settle().await;
        q.tick();
        assert_eq!(q.data(), &vec![2]);

        release(&pending, 0, Ok(vec![1]));
        settle().await;
        q.tick();
        assert_eq!(q.data(), &vec![1]);
    }

    #[tokio::test]
    async fn test_error_keeps_data_and_retries() {
        let (fetcher, pending) = gated();
        let mut q = query(fetcher, Duration::ZERO);
        q.set_key(Some("a".to_string()));

        q.tick();
        release(&pending, 0, Ok(vec![7]));
        settle().await;
        // Zero interval: applying the result and re-dispatching happen together
        q.tick();
        assert_eq!(dispatched(&pending).len(), 1);

        release(&pending, 0, Err(ApiError::Connection("refused".to_string())));
        settle().await;
        q.poll();

        assert_eq!(q.state().phase, Phase::Error);
        assert!(q.state().error.as_deref().unwrap().contains("refused"));
        assert_eq!(q.data(), &vec![7]);

        // Next tick retries; a success clears the error
        q.tick();
        assert_eq!(dispatched(&pending).len(), 1);
        release(&pending, 0, Ok(vec![8]));
        settle().await;
        q.poll();
        assert_eq!(q.state().phase, Phase::Ready);
        assert!(q.state().error.is_none());
        assert_eq!(q.data(), &vec![8]);
    }

    #[tokio::test]
    async fn test_returning_to_cached_key_shows_data() {
        let (fetcher, pending) = gated();
        let mut q = query(fetcher, Duration::from_secs(3600));

        q.set_key(Some("a".to_string()));
        q.tick();
        release(&pending, 0, Ok(vec![1]));
        settle().await;
        q.tick();

        q.set_key(Some("b".to_string()));
        assert!(q.data().is_empty());

        assert!(q.set_key(Some("a".to_string())));
        assert_eq!(q.data(), &vec![1]);
        assert!(!q.set_key(Some("a".to_string())));
    }

    #[tokio::test]
    async fn test_disabling_drops_in_flight_response() {
        let (fetcher, pending) = gated();
        let mut q = query(fetcher, Duration::ZERO);
        q.set_key(Some("a".to_string()));
        q.tick();

        q.set_key(None);
        release(&pending, 0, Ok(vec![1]));
        settle().await;

        assert!(!q.tick());
        assert_eq!(q.state().phase, Phase::Idle);
    }

    #[tokio::test]
    async fn test_cache_keeps_only_recent_keys() {
        let (fetcher, pending) = gated();
        let mut q = query(fetcher, Duration::from_secs(3600));

        for i in 0..500 {
            q.set_key(Some(format!("kw{i}")));
            q.tick();
            release(&pending, 0, Ok(vec![i]));
            settle_briefly().await;
            q.poll();
        }
        settle().await;
        q.poll();
        q.set_key(None);
        assert_eq!(q.cached_keys(), MAX_CACHED_KEYS);

        // The newest keys survive, the oldest are gone
        q.set_key(Some("kw499".to_string()));
        assert_eq!(q.data(), &vec![499]);
        q.set_key(Some("kw0".to_string()));
        assert!(!q.state().has_data());
    }

    #[tokio::test]
    async fn test_revisited_key_is_not_evicted() {
        let (fetcher, pending) = gated();
        let mut q = query(fetcher, Duration::from_secs(3600));

        q.set_key(Some("home".to_string()));
        q.tick();
        release(&pending, 0, Ok(vec![1]));
        settle().await;
        q.poll();

        for i in 0..20 {
            q.set_key(Some(format!("other{i}")));
            q.set_key(Some("home".to_string()));
        }
        assert!(q.cached_keys() <= MAX_CACHED_KEYS);
        assert_eq!(q.data(), &vec![1]);
    }
}
