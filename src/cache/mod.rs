//! The query cache: fetched data keyed by [`QueryKey`], with freshness,
//! request deduplication, invalidation and idle eviction.
//!
//! A [`QueryClient`] is created once per application instance and handed to
//! every consumer. Cloning it is cheap; all clones share one cache.
//!
//! ## Lifecycle of an entry
//!
//! 1. [`QueryClient::fetch_query`] finds no fresh data and starts a fetch on a
//!    spawned task. Concurrent callers for the same key join that fetch.
//! 2. The result is written to the entry, which is *fresh* for
//!    [`stale_time`](crate::config::QueryClientConfig::stale_time).
//! 3. Once stale (or invalidated) the next access refetches.
//!    [`QueryClient::ensure_query_data`] hands out the stale value at once and
//!    refreshes in the background instead.
//! 4. An entry nobody has read or written for
//!    [`gc_time`](crate::config::QueryClientConfig::gc_time) is evicted by the
//!    underlying [`moka`] cache.
//!
//! ## Ordering
//!
//! Every write, invalidation or cancellation moves an entry's version. A fetch
//! remembers the version it started from and its result is only written back
//! if the version is unchanged, so a late response never overwrites newer
//! state. Waiters still receive the late result.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use moka::notification::RemovalCause;
use moka::sync::Cache;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::QueryClientConfig;
use crate::error::FetchError;
use crate::keys::QueryKey;
use crate::retry::retry;

pub mod invalidation;

pub use invalidation::MutationKind;

type AnyData = Arc<dyn Any + Send + Sync>;
type FetchResult = Result<AnyData, FetchError>;
type FetchFuture = Pin<Box<dyn Future<Output = FetchResult> + Send>>;

// Type-erased fetcher kept on the entry so refetch triggers can re-run it.
type ErasedFetcher = Arc<dyn Fn() -> FetchFuture + Send + Sync>;

/// Freshness of a cached entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// Served from cache without a refetch.
    Fresh,
    /// Refetched on next access.
    Stale,
    /// The last fetch failed. Any previous data is kept.
    Error,
}

/// Snapshot of an entry, for consumers rendering loading/error states.
#[derive(Debug, Clone)]
pub struct QueryState {
    pub status: EntryStatus,
    pub updated_at: Option<Instant>,
    pub is_invalidated: bool,
    /// A fetch for this key is in flight.
    pub is_fetching: bool,
    pub has_data: bool,
    pub error: Option<FetchError>,
}

/// Events that can cause cached queries to be refetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefetchTrigger {
    /// A consumer of this key was mounted.
    Mount(QueryKey),
    /// The application window regained focus.
    WindowFocus,
    /// Network connectivity came back.
    Reconnect,
}

/// Outcome of [`QueryClient::refetch_on`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefetchReport {
    pub refetched: usize,
    pub failed: usize,
}

#[derive(Clone)]
struct CacheEntry {
    data: Option<AnyData>,
    error: Option<FetchError>,
    updated_at: Option<Instant>,
    invalidated: bool,
    version: u64,
    fetcher: Option<ErasedFetcher>,
}

impl CacheEntry {
    fn empty(version: u64) -> Self {
        Self {
            data: None,
            error: None,
            updated_at: None,
            invalidated: false,
            version,
            fetcher: None,
        }
    }

    fn status(&self, now: Instant, stale_time: Duration) -> EntryStatus {
        if self.error.is_some() {
            return EntryStatus::Error;
        }
        match (self.updated_at, &self.data) {
            (Some(updated_at), Some(_))
                if !self.invalidated && now.duration_since(updated_at) < stale_time =>
            {
                EntryStatus::Fresh
            }
            _ => EntryStatus::Stale,
        }
    }
}

struct InFlight {
    id: u64,
    rx: watch::Receiver<Option<FetchResult>>,
}

#[derive(Default)]
struct State {
    in_flight: HashMap<QueryKey, InFlight>,
    // Shared counter for entry versions and fetch ids.
    counter: u64,
}

impl State {
    fn next(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }
}

struct Inner {
    config: QueryClientConfig,
    entries: Cache<QueryKey, CacheEntry>,
    // Every read-modify-write of `entries` happens under this lock, so a
    // version check and the write that follows it cannot interleave.
    state: Mutex<State>,
}

impl Inner {
    fn new(config: QueryClientConfig) -> Self {
        let entries = Cache::builder()
            .time_to_idle(config.gc_time)
            .eviction_listener(|key: Arc<QueryKey>, _entry: CacheEntry, cause: RemovalCause| {
                if cause.was_evicted() {
                    debug!(key = %key, ?cause, "evicted idle cache entry");
                }
            })
            .build();
        Self {
            config,
            entries,
            state: Mutex::new(State::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // No invariant spans a panic point, so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Records `fetcher` on an existing entry and reports what it holds.
    fn touch(
        &self,
        key: &QueryKey,
        fetcher: &ErasedFetcher,
    ) -> Option<(EntryStatus, Option<AnyData>)> {
        let mut entry = self.entries.get(key)?;
        entry.fetcher = Some(Arc::clone(fetcher));
        let seen = (
            entry.status(Instant::now(), self.config.stale_time),
            entry.data.clone(),
        );
        self.entries.insert(key.clone(), entry);
        Some(seen)
    }

    fn matching(&self, prefix: &QueryKey) -> Vec<(Arc<QueryKey>, CacheEntry)> {
        self.entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .collect()
    }

    // Bumps the version of every entry under `prefix`, optionally flagging it stale.
    fn mark_matching(&self, state: &mut State, prefix: &QueryKey, invalidate: bool) -> usize {
        let matching = self.matching(prefix);
        let count = matching.len();
        for (key, mut entry) in matching {
            entry.version = state.next();
            if invalidate {
                entry.invalidated = true;
            }
            self.entries.insert(QueryKey::clone(&key), entry);
        }
        count
    }

    // Writes a finished fetch back unless the entry moved on while it ran.
    fn settle(&self, key: &QueryKey, fetch_id: u64, started_from: u64, result: &FetchResult) {
        let mut state = self.lock();
        if state.in_flight.get(key).is_some_and(|f| f.id == fetch_id) {
            state.in_flight.remove(key);
        }

        let Some(mut entry) = self
            .entries
            .get(key)
            .filter(|entry| entry.version == started_from)
        else {
            debug!(key = %key, "discarding result of superseded fetch");
            return;
        };

        entry.version = state.next();
        match result {
            Ok(data) => {
                entry.data = Some(Arc::clone(data));
                entry.error = None;
                entry.updated_at = Some(Instant::now());
                entry.invalidated = false;
            }
            Err(e) => {
                entry.error = Some(e.clone());
            }
        }
        self.entries.insert(key.clone(), entry);
    }
}

/// Shared handle to the query cache.
///
/// # Examples
///
/// ```rust,no_run
/// use aircare::cache::QueryClient;
/// use aircare::config::QueryClientConfig;
/// use aircare::keys::services;
///
/// # async fn example() -> Result<(), aircare::FetchError> {
/// let client = QueryClient::new(QueryClientConfig::default());
/// let names = client
///     .fetch_query(services::stats(), || async {
///         Ok::<_, aircare::FetchError>(vec!["ac-repair".to_string()])
///     })
///     .await?;
/// assert_eq!(names.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<Inner>,
}

impl QueryClient {
    /// Creates an empty cache. Entries idle for `config.gc_time` are evicted.
    pub fn new(config: QueryClientConfig) -> Self {
        Self {
            inner: Arc::new(Inner::new(config)),
        }
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &QueryClientConfig {
        &self.inner.config
    }

    /// Returns cached data for `key` if fresh, otherwise fetches it.
    ///
    /// Identical concurrent requests share a single fetch. The fetch runs on
    /// a spawned task with the configured query retry policy, so dropping
    /// this future does not cancel it for other waiters.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns the fetch's final error after retries, or
    /// [`FetchError::TypeMismatch`] if the key holds a different type.
    pub async fn fetch_query<T, F, Fut>(
        &self,
        key: QueryKey,
        fetcher: F,
    ) -> Result<Arc<T>, FetchError>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let fetcher = erase(fetcher);
        let rx = {
            let mut state = self.inner.lock();
            if let Some((EntryStatus::Fresh, Some(data))) = self.inner.touch(&key, &fetcher) {
                debug!(key = %key, "serving fresh data from cache");
                return downcast(&key, data);
            }
            self.start_or_join(&mut state, &key, fetcher)
        };

        let data = wait_for_result(rx).await?;
        downcast(&key, data)
    }

    /// Stale-while-revalidate access.
    ///
    /// Cached data is returned at once, fresh or not. When it is stale,
    /// invalidated or left over from a failed fetch, a background refetch is
    /// started (or joined) and not awaited; its result lands in the cache for
    /// the next read. With nothing cached this waits like
    /// [`fetch_query`](Self::fetch_query).
    ///
    /// # Errors
    ///
    /// Only when nothing was cached and the fetch failed, or on
    /// [`FetchError::TypeMismatch`].
    pub async fn ensure_query_data<T, F, Fut>(
        &self,
        key: QueryKey,
        fetcher: F,
    ) -> Result<Arc<T>, FetchError>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let fetcher = erase(fetcher);
        let rx = {
            let mut state = self.inner.lock();
            match self.inner.touch(&key, &fetcher) {
                Some((EntryStatus::Fresh, Some(data))) => return downcast(&key, data),
                Some((_, Some(data))) => {
                    let data = downcast(&key, data)?;
                    debug!(key = %key, "serving stale data while refreshing");
                    // The spawned fetch settles into the cache without a waiter.
                    let _ = self.start_or_join(&mut state, &key, fetcher);
                    return Ok(data);
                }
                _ => self.start_or_join(&mut state, &key, fetcher),
            }
        };

        let data = wait_for_result(rx).await?;
        downcast(&key, data)
    }

    /// Refetches `key` with its stored fetcher, regardless of freshness.
    ///
    /// Returns `None` when the key has never been fetched through
    /// [`fetch_query`](Self::fetch_query).
    pub async fn refetch(&self, key: &QueryKey) -> Option<Result<(), FetchError>> {
        let rx = {
            let mut state = self.inner.lock();
            let fetcher = self.inner.entries.get(key)?.fetcher?;
            self.start_or_join(&mut state, key, fetcher)
        };
        Some(wait_for_result(rx).await.map(|_| ()))
    }

    // Joins the in-flight fetch for `key` or spawns a new one.
    fn start_or_join(
        &self,
        state: &mut State,
        key: &QueryKey,
        fetcher: ErasedFetcher,
    ) -> watch::Receiver<Option<FetchResult>> {
        if let Some(flight) = state.in_flight.get(key) {
            debug!(key = %key, "joining in-flight fetch");
            return flight.rx.clone();
        }

        let started_from = match self.inner.entries.get(key) {
            Some(entry) => entry.version,
            None => {
                let version = state.next();
                let mut entry = CacheEntry::empty(version);
                entry.fetcher = Some(Arc::clone(&fetcher));
                self.inner.entries.insert(key.clone(), entry);
                version
            }
        };

        let fetch_id = state.next();
        let (tx, rx) = watch::channel(None);
        state.in_flight.insert(
            key.clone(),
            InFlight {
                id: fetch_id,
                rx: rx.clone(),
            },
        );

        let inner = Arc::clone(&self.inner);
        let key = key.clone();
        let policy = inner.config.query_retry;
        debug!(key = %key, "starting fetch");

        tokio::spawn(async move {
            let label = key.to_string();
            let result = retry(policy, &label, || fetcher()).await;
            match &result {
                Ok(_) => debug!(key = %key, "fetch succeeded"),
                Err(e) => warn!(key = %key, error = %e, "fetch failed"),
            }
            inner.settle(&key, fetch_id, started_from, &result);
            // Every receiver may already be gone; that is fine.
            let _ = tx.send(Some(result));
        });

        rx
    }

    /// Returns cached data for `key` without fetching, fresh or not.
    pub fn get_query_data<T>(&self, key: &QueryKey) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let data = self.inner.entries.get(key)?.data?;
        data.downcast::<T>().ok()
    }

    /// Writes `value` into the cache as freshly fetched data.
    ///
    /// Any fetch for `key` already in flight will not overwrite it.
    pub fn set_query_data<T>(&self, key: QueryKey, value: T)
    where
        T: Send + Sync + 'static,
    {
        let mut state = self.inner.lock();
        let version = state.next();
        let mut entry = self
            .inner
            .entries
            .get(&key)
            .unwrap_or_else(|| CacheEntry::empty(version));
        entry.version = version;
        entry.data = Some(Arc::new(value));
        entry.error = None;
        entry.updated_at = Some(Instant::now());
        entry.invalidated = false;
        self.inner.entries.insert(key, entry);
    }

    /// Snapshot of `key`'s entry, or `None` if nothing is cached for it.
    ///
    /// Counts as an access for idle eviction.
    pub fn query_state(&self, key: &QueryKey) -> Option<QueryState> {
        let state = self.inner.lock();
        let entry = self.inner.entries.get(key)?;
        Some(QueryState {
            status: entry.status(Instant::now(), self.inner.config.stale_time),
            updated_at: entry.updated_at,
            is_invalidated: entry.invalidated,
            is_fetching: state.in_flight.contains_key(key),
            has_data: entry.data.is_some(),
            error: entry.error,
        })
    }

    /// Marks every entry under `prefix` stale and detaches in-flight fetches
    /// for them, so the next access fetches again.
    ///
    /// Returns the number of entries invalidated.
    pub fn invalidate_queries(&self, prefix: &QueryKey) -> usize {
        let mut state = self.inner.lock();
        let count = self.inner.mark_matching(&mut state, prefix, true);
        state.in_flight.retain(|key, _| !key.starts_with(prefix));
        info!(prefix = %prefix, count, "invalidated queries");
        count
    }

    /// Drops in-flight fetches under `prefix`. Their results are discarded on arrival.
    pub fn cancel_queries(&self, prefix: &QueryKey) -> usize {
        let mut state = self.inner.lock();
        self.inner.mark_matching(&mut state, prefix, false);
        let before = state.in_flight.len();
        state.in_flight.retain(|key, _| !key.starts_with(prefix));
        let cancelled = before - state.in_flight.len();
        if cancelled > 0 {
            debug!(prefix = %prefix, cancelled, "cancelled in-flight fetches");
        }
        cancelled
    }

    /// Removes every entry under `prefix`.
    pub fn remove_queries(&self, prefix: &QueryKey) -> usize {
        let mut state = self.inner.lock();
        let matching = self.inner.matching(prefix);
        for (key, _) in &matching {
            self.inner.entries.invalidate(key.as_ref());
        }
        state.in_flight.retain(|key, _| !key.starts_with(prefix));
        matching.len()
    }

    /// Runs eviction housekeeping now instead of on the next cache write.
    pub fn run_pending_tasks(&self) {
        self.inner.entries.run_pending_tasks();
    }

    /// Drops every entry and in-flight fetch.
    pub fn clear(&self) {
        let mut state = self.inner.lock();
        self.inner.entries.invalidate_all();
        state.in_flight.clear();
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        // `entry_count` lags behind pending writes; iteration does not.
        self.inner.entries.iter().count()
    }

    /// `true` when no entry is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys a trigger would refetch under the current configuration.
    ///
    /// - Reconnect: every fetchable entry, when enabled.
    /// - Window focus: stale fetchable entries, when enabled (production only by default).
    /// - Mount: the mounted key, when enabled and its entry is stale. An
    ///   absent key has no fetcher yet; its first
    ///   [`fetch_query`](Self::fetch_query) fetches it.
    pub fn refetch_targets(&self, trigger: &RefetchTrigger) -> Vec<QueryKey> {
        let config = &self.inner.config;
        let now = Instant::now();
        let is_stale =
            |entry: &CacheEntry| entry.status(now, config.stale_time) != EntryStatus::Fresh;
        let fetchable = self
            .inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.fetcher.is_some());

        match trigger {
            RefetchTrigger::Reconnect if config.refetch_on_reconnect => {
                fetchable.map(|(key, _)| QueryKey::clone(&key)).collect()
            }
            RefetchTrigger::WindowFocus if config.refetch_on_window_focus => fetchable
                .filter(|(_, entry)| is_stale(entry))
                .map(|(key, _)| QueryKey::clone(&key))
                .collect(),
            RefetchTrigger::Mount(key) if config.refetch_on_mount => self
                .inner
                .entries
                .get(key)
                .filter(|entry| entry.fetcher.is_some() && is_stale(entry))
                .map(|_| vec![key.clone()])
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Refetches whatever `trigger` targets and waits for all of them.
    pub async fn refetch_on(&self, trigger: RefetchTrigger) -> RefetchReport {
        let targets = self.refetch_targets(&trigger);
        debug!(?trigger, count = targets.len(), "refetching");

        let receivers: Vec<_> = {
            let mut state = self.inner.lock();
            targets
                .iter()
                .filter_map(|key| {
                    let fetcher = self.inner.entries.get(key)?.fetcher?;
                    Some(self.start_or_join(&mut state, key, fetcher))
                })
                .collect()
        };

        let mut report = RefetchReport::default();
        for rx in receivers {
            match wait_for_result(rx).await {
                Ok(_) => report.refetched += 1,
                Err(_) => report.failed += 1,
            }
        }
        report
    }

    /// Runs a mutation with the mutation retry policy and, on success,
    /// invalidates the subtrees `kind` affects.
    ///
    /// # Errors
    ///
    /// Returns the mutation's error once its retry is spent. Nothing is
    /// invalidated on failure.
    pub async fn mutate<T, F, Fut>(&self, kind: MutationKind, op: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let policy = self.inner.config.mutation_retry;
        match retry(policy, kind.as_str(), op).await {
            Ok(value) => {
                let invalidated: usize = kind
                    .invalidates()
                    .iter()
                    .map(|root| self.invalidate_queries(root))
                    .sum();
                info!(mutation = %kind, invalidated, "mutation succeeded");
                Ok(value)
            }
            Err(e) => {
                warn!(mutation = %kind, error = %e, "mutation failed");
                Err(e)
            }
        }
    }
}

fn erase<T, F, Fut>(fetcher: F) -> ErasedFetcher
where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
{
    Arc::new(move || -> FetchFuture {
        let fut = fetcher();
        Box::pin(async move { fut.await.map(|value| Arc::new(value) as AnyData) })
    })
}

fn downcast<T>(key: &QueryKey, data: AnyData) -> Result<Arc<T>, FetchError>
where
    T: Send + Sync + 'static,
{
    data.downcast::<T>().map_err(|_| FetchError::TypeMismatch {
        key: key.to_string(),
    })
}

async fn wait_for_result(mut rx: watch::Receiver<Option<FetchResult>>) -> FetchResult {
    match rx.wait_for(Option::is_some).await {
        Ok(result) => result.clone().unwrap_or(Err(FetchError::Cancelled)),
        // The fetch task ended without reporting (panicked or aborted).
        Err(_) => Err(FetchError::Cancelled),
    }
}
