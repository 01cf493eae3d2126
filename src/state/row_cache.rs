//! RowCache - Sparse, Page-Fetched Row Cache
//!
//! Rows of a long rank-ordered collection are fetched a page at a time and
//! kept by absolute row index. Concurrent lookups of one uncached page share
//! a single fetch, and an invalidation drops every row and every in-flight
//! fetch at once.
//!
//! ## Lookup
//!
//! ```text
//! fetch(index)
//!   ├── cached ─────────────► Ready(row)
//!   ├── page in flight ─────► Pending(wait shared fetch, re-read)
//!   └── otherwise ──────────► spawn fetch, record page, Pending(...)
//!
//! peek(index)
//!   ├── cached ─────────────► Some(row)
//!   └── otherwise ──────────► None            (never touches the network)
//! ```
//!
//! Each fetch records the generation it started in. When it completes it
//! writes rows and clears its in-flight entry only if the generation has not
//! moved, so a completion that races an invalidation never repopulates the
//! emptied cache.

use ahash::AHashMap;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use std::any::Any;
use std::ops::Range;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::domain::LadderRow;
use crate::error::{Error, Result, SharedError};
use crate::services::runtime;

/// Source of pages for a [`RowCache`]
pub trait PageSource: Send + Sync + 'static {
    /// Fetch one page (1-based); at most `page_size` rows, in rank order
    fn fetch_page(&self, page: u32, page_size: usize) -> BoxFuture<'static, Result<Vec<LadderRow>>>;

    /// Short label for log lines
    fn describe(&self) -> String {
        "rows".to_string()
    }
}

/// Future resolving to a row once its page has been fetched
///
/// Resolves to `None` when the page came back without that index (past the
/// end of the collection).
pub type RowFuture = BoxFuture<'static, std::result::Result<Option<Arc<LadderRow>>, SharedError>>;

type PageOutcome = std::result::Result<(), SharedError>;
type SharedPage = Shared<BoxFuture<'static, PageOutcome>>;

/// Result of a row lookup
pub enum Load {
    /// Row was cached
    Ready(Arc<LadderRow>),
    /// Row's page is being fetched
    Pending(RowFuture),
    /// Row is not cached and the lookup was cache-only
    Missing,
}

impl Load {
    /// Cached row, if the lookup was answered synchronously
    pub fn ready(&self) -> Option<&Arc<LadderRow>> {
        match self {
            Load::Ready(row) => Some(row),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Load::Pending(_))
    }
}

impl std::fmt::Debug for Load {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Load::Ready(row) => f.debug_tuple("Ready").field(&row.rank).finish(),
            Load::Pending(_) => f.write_str("Pending"),
            Load::Missing => f.write_str("Missing"),
        }
    }
}

/// First row index of a 1-based page
pub fn page_start(page: u32, page_size: usize) -> usize {
    (page as usize).saturating_sub(1) * page_size
}

/// 1-based page owning a row index
pub fn page_of(index: usize, page_size: usize) -> u32 {
    (index / page_size) as u32 + 1
}

struct InFlight {
    fetch: SharedPage,
    abort: AbortHandle,
}

/// Rows plus in-flight bookkeeping for one generation
#[derive(Default)]
struct CacheState {
    generation: u64,
    rows: AHashMap<usize, Arc<LadderRow>>,
    in_flight: AHashMap<u32, InFlight>,
}

impl CacheState {
    /// Write a fetched page; returns false when the fetch is stale
    fn store_page(
        &mut self,
        generation: u64,
        page: u32,
        page_size: usize,
        rows: Vec<LadderRow>,
    ) -> bool {
        if generation != self.generation {
            return false;
        }

        self.in_flight.remove(&page);
        let start = page_start(page, page_size);
        for (offset, mut row) in rows.into_iter().enumerate() {
            row.sort_challenges();
            self.rows.insert(start + offset, Arc::new(row));
        }
        true
    }

    /// Forget a failed fetch without touching rows
    fn abandon_page(&mut self, generation: u64, page: u32) {
        if generation == self.generation {
            self.in_flight.remove(&page);
        }
    }

    /// Drop everything and move to the next generation
    fn reset(&mut self) -> (u64, usize) {
        let aborted = self.in_flight.len();
        for (_, fetch) in self.in_flight.drain() {
            fetch.abort.abort();
        }
        self.rows = AHashMap::new();
        self.generation += 1;
        (self.generation, aborted)
    }
}

struct Inner<S> {
    source: S,
    page_size: usize,
    state: Mutex<CacheState>,
    generation_tx: watch::Sender<u64>,
}

impl<S> Drop for Inner<S> {
    fn drop(&mut self) {
        for (_, fetch) in self.state.get_mut().in_flight.drain() {
            fetch.abort.abort();
        }
    }
}

/// Handle to a page-fetched row cache
///
/// Clones share the same cache. The owning view creates it; row bindings
/// get clones and only use the lookup methods.
pub struct RowCache<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for RowCache<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: PageSource> RowCache<S> {
    /// Create an empty cache over a page source
    pub fn new(source: S, page_size: usize) -> Self {
        let (generation_tx, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                source,
                page_size: page_size.max(1),
                state: Mutex::new(CacheState::default()),
                generation_tx,
            }),
        }
    }

    pub fn page_size(&self) -> usize {
        self.inner.page_size
    }

    pub fn source(&self) -> &S {
        &self.inner.source
    }

    /// Current invalidation counter
    pub fn generation(&self) -> u64 {
        self.inner.state.lock().generation
    }

    /// Receiver that observes every invalidation
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.generation_tx.subscribe()
    }

    /// Cached row, without any network access
    pub fn peek(&self, index: usize) -> Option<Arc<LadderRow>> {
        self.inner.state.lock().rows.get(&index).cloned()
    }

    /// Cached row, or a future for it, fetching its page if needed
    pub fn fetch(&self, index: usize) -> Load {
        let page = page_of(index, self.inner.page_size);
        let mut state = self.inner.state.lock();

        if let Some(row) = state.rows.get(&index) {
            return Load::Ready(Arc::clone(row));
        }

        let generation = state.generation;
        let existing = state.in_flight.get(&page).map(|f| f.fetch.clone());
        let fetch = match existing {
            Some(fetch) => fetch,
            None => self.start_fetch(&mut state, page),
        };
        drop(state);

        Load::Pending(self.read_after(fetch, index, generation))
    }

    /// Lookup honoring the scroll state: cache-only while scrolling
    pub fn load(&self, index: usize, cache_only: bool) -> Load {
        if cache_only {
            match self.peek(index) {
                Some(row) => Load::Ready(row),
                None => Load::Missing,
            }
        } else {
            self.fetch(index)
        }
    }

    /// Start fetches for every uncached, idle page covering `range`
    ///
    /// Returns the number of fetches started.
    pub fn prefetch(&self, range: Range<usize>) -> usize {
        if range.is_empty() {
            return 0;
        }

        let page_size = self.inner.page_size;
        let first = page_of(range.start, page_size);
        let last = page_of(range.end - 1, page_size);
        let mut state = self.inner.state.lock();
        let mut started = 0;

        for page in first..=last {
            if state.in_flight.contains_key(&page) {
                continue;
            }
            let start = page_start(page, page_size).max(range.start);
            let end = (page_start(page, page_size) + page_size).min(range.end);
            if (start..end).all(|i| state.rows.contains_key(&i)) {
                continue;
            }
            self.start_fetch(&mut state, page);
            started += 1;
        }
        started
    }

    /// Whether every row of `range` is cached
    pub fn is_range_loaded(&self, range: Range<usize>) -> bool {
        let state = self.inner.state.lock();
        range.into_iter().all(|i| state.rows.contains_key(&i))
    }

    /// Drop all rows and in-flight fetches; returns the new generation
    pub fn invalidate(&self) -> u64 {
        let (generation, aborted) = self.inner.state.lock().reset();
        self.inner.generation_tx.send_replace(generation);
        info!(
            "Invalidated {} (generation {}, {} request(s) aborted)",
            self.inner.source.describe(),
            generation,
            aborted
        );
        generation
    }

    /// Number of cached rows
    pub fn cached_rows(&self) -> usize {
        self.inner.state.lock().rows.len()
    }

    /// Pages currently being fetched, ascending
    pub fn in_flight_pages(&self) -> Vec<u32> {
        let mut pages: Vec<u32> = self.inner.state.lock().in_flight.keys().copied().collect();
        pages.sort_unstable();
        pages
    }

    fn start_fetch(&self, state: &mut CacheState, page: u32) -> SharedPage {
        let generation = state.generation;
        let page_size = self.inner.page_size;
        let request = self.inner.source.fetch_page(page, page_size);
        let weak: Weak<Inner<S>> = Arc::downgrade(&self.inner);

        debug!(
            "Fetching {} page {} (generation {})",
            self.inner.source.describe(),
            page,
            generation
        );

        let task = runtime::spawn(async move {
            let result = match AssertUnwindSafe(request).catch_unwind().await {
                Ok(result) => result,
                Err(panic) => Err(Error::TaskFailed {
                    page,
                    message: panic_message(panic.as_ref()),
                }),
            };
            let Some(inner) = weak.upgrade() else {
                return Err(Arc::new(Error::Cancelled { page }));
            };
            let mut state = inner.state.lock();

            match result {
                Ok(rows) => {
                    let count = rows.len();
                    if state.store_page(generation, page, inner.page_size, rows) {
                        debug!("Stored page {} ({} rows)", page, count);
                    } else {
                        debug!(
                            "Discarding page {} from generation {} (now {})",
                            page, generation, state.generation
                        );
                    }
                    Ok(())
                }
                Err(err) => {
                    state.abandon_page(generation, page);
                    warn!("Fetching page {} failed: {}", page, err);
                    Err(Arc::new(err))
                }
            }
        });

        let abort = task.abort_handle();
        let fetch = async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(err) if err.is_cancelled() => Err(Arc::new(Error::Cancelled { page })),
                Err(err) => Err(Arc::new(Error::TaskFailed {
                    page,
                    message: err.to_string(),
                })),
            }
        }
        .boxed()
        .shared();

        state.in_flight.insert(
            page,
            InFlight {
                fetch: fetch.clone(),
                abort,
            },
        );
        fetch
    }

    fn read_after(&self, fetch: SharedPage, index: usize, generation: u64) -> RowFuture {
        let inner = Arc::clone(&self.inner);
        async move {
            fetch.await?;
            let state = inner.state.lock();
            if state.generation != generation {
                return Err(Arc::new(Error::Invalidated {
                    expected: generation,
                    current: state.generation,
                }));
            }
            Ok(state.rows.get(&index).cloned())
        }
        .boxed()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic".to_string()
    }
}

impl<S: PageSource> std::fmt::Debug for RowCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("RowCache")
            .field("source", &self.inner.source.describe())
            .field("generation", &state.generation)
            .field("rows", &state.rows.len())
            .field("in_flight", &state.in_flight.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LadderId;
    use crate::services::LadderPlayers;
    use crate::state::testing::{FakeLadderApi, fake_row};

    use std::sync::atomic::{AtomicUsize, Ordering};

    fn page_rows(page: u32, page_size: usize) -> Vec<LadderRow> {
        let start = page_start(page, page_size);
        (start..start + page_size).map(|i| fake_row(i, 0)).collect()
    }

    /// Panics while fetching the first page it is asked for
    #[derive(Default)]
    struct PanicOnce {
        calls: AtomicUsize,
    }

    impl PageSource for PanicOnce {
        fn fetch_page(&self, page: u32, page_size: usize) -> BoxFuture<'static, Result<Vec<LadderRow>>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 0 {
                    panic!("page source blew up");
                }
                Ok(page_rows(page, page_size))
            }
            .boxed()
        }
    }

    type Hook = Box<dyn Fn() + Send + Sync>;

    /// Runs a hook at the end of each fetch, right before handing rows back
    #[derive(Default)]
    struct HookedSource {
        on_complete: Arc<Mutex<Option<Hook>>>,
    }

    impl PageSource for HookedSource {
        fn fetch_page(&self, page: u32, page_size: usize) -> BoxFuture<'static, Result<Vec<LadderRow>>> {
            let hook = Arc::clone(&self.on_complete);
            async move {
                if let Some(hook) = hook.lock().as_ref() {
                    hook();
                }
                Ok(page_rows(page, page_size))
            }
            .boxed()
        }
    }

    fn cache(api: &Arc<FakeLadderApi>) -> RowCache<LadderPlayers<FakeLadderApi>> {
        RowCache::new(LadderPlayers::new(Arc::clone(api), LadderId(1)), 20)
    }

    async fn resolve(load: Load) -> std::result::Result<Option<Arc<LadderRow>>, SharedError> {
        match load {
            Load::Ready(row) => Ok(Some(row)),
            Load::Pending(future) => future.await,
            Load::Missing => Ok(None),
        }
    }

    #[test]
    fn test_page_arithmetic() {
        assert_eq!(page_of(0, 20), 1);
        assert_eq!(page_of(19, 20), 1);
        assert_eq!(page_of(20, 20), 2);
        assert_eq!(page_of(25, 20), 2);
        assert_eq!(page_start(2, 20), 20);
        assert_eq!(page_start(1, 20), 0);
    }

    #[tokio::test]
    async fn test_miss_fetches_page_then_hits_cache() {
        let api = Arc::new(FakeLadderApi::new(100));
        let cache = cache(&api);

        let row = resolve(cache.fetch(25)).await.expect("fetch").expect("row");
        assert_eq!(row.rank, 26);
        assert_eq!(api.page_calls(), vec![2]);
        assert_eq!(cache.cached_rows(), 20);
        assert!(cache.is_range_loaded(20..40));
        assert!(!cache.is_range_loaded(19..21));

        let again = cache.load(30, false);
        assert_eq!(again.ready().map(|r| r.rank), Some(31));
        assert_eq!(api.page_calls(), vec![2]);
        assert!(cache.in_flight_pages().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_one_fetch() {
        let api = Arc::new(FakeLadderApi::new(100));
        api.hold();
        let cache = cache(&api);

        let a = cache.fetch(25);
        let b = cache.fetch(27);
        assert!(a.is_pending() && b.is_pending());
        assert_eq!(api.page_calls(), vec![2]);
        assert_eq!(cache.in_flight_pages(), vec![2]);

        api.release();
        let (a, b) = futures::join!(resolve(a), resolve(b));
        let a = a.expect("a").expect("row 25");
        let b = b.expect("b").expect("row 27");

        assert_eq!(a.rank, 26);
        assert_eq!(b.rank, 28);
        assert_eq!(a.player.username, fake_row(25, 0).player.username);
        assert_eq!(api.page_calls(), vec![2]);
        assert!(cache.in_flight_pages().is_empty());
    }

    #[tokio::test]
    async fn test_cache_only_never_fetches() {
        let api = Arc::new(FakeLadderApi::new(100));
        let cache = cache(&api);

        assert!(cache.peek(5).is_none());
        assert!(matches!(cache.load(5, true), Load::Missing));
        assert!(api.page_calls().is_empty());
        assert!(cache.in_flight_pages().is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_clears_rows_and_bumps_generation() {
        let api = Arc::new(FakeLadderApi::new(100));
        let cache = cache(&api);
        let mut generations = cache.subscribe();

        resolve(cache.fetch(0)).await.expect("page 1");
        resolve(cache.fetch(20)).await.expect("page 2");
        assert_eq!(cache.cached_rows(), 40);

        let before = cache.generation();
        let after = cache.invalidate();
        assert_eq!(after, before + 1);
        assert_eq!(cache.generation(), before + 1);
        assert_eq!(cache.cached_rows(), 0);
        assert!((0..40).all(|i| matches!(cache.load(i, true), Load::Missing)));

        assert!(generations.has_changed().expect("sender alive"));
        assert_eq!(*generations.borrow_and_update(), after);
    }

    #[tokio::test]
    async fn test_invalidate_during_fetch_discards_result() {
        let api = Arc::new(FakeLadderApi::new(100));
        api.hold();
        let cache = cache(&api);

        let pending = cache.fetch(25);
        assert_eq!(cache.in_flight_pages(), vec![2]);

        cache.invalidate();
        assert!(cache.in_flight_pages().is_empty());
        api.release();

        let err = resolve(pending).await.expect_err("stale fetch must not resolve a row");
        assert!(err.is_stale());
        assert!(cache.peek(25).is_none());
        assert_eq!(cache.cached_rows(), 0);

        // The next lookup starts a fresh fetch in the new generation
        let row = resolve(cache.fetch(25)).await.expect("refetch").expect("row");
        assert_eq!(row.rank, 26);
        assert_eq!(api.page_calls(), vec![2, 2]);
    }

    #[test]
    fn test_stale_generation_is_not_stored() {
        let mut state = CacheState::default();
        state.reset();
        assert_eq!(state.generation, 1);

        let rows = (20..40).map(|i| fake_row(i, 0)).collect();
        assert!(!state.store_page(0, 2, 20, rows));
        assert!(state.rows.is_empty());

        let rows = (20..40).map(|i| fake_row(i, 0)).collect();
        assert!(state.store_page(1, 2, 20, rows));
        assert_eq!(state.rows.len(), 20);
        assert!(state.rows.contains_key(&39));
    }

    #[tokio::test]
    async fn test_challenges_sorted_on_write() {
        let api = Arc::new(FakeLadderApi::new(100));
        let cache = cache(&api);

        let row = resolve(cache.fetch(3)).await.expect("fetch").expect("row");
        let ranks: Vec<i64> = row
            .outgoing_challenges
            .iter()
            .map(|c| c.player.ladder_rank)
            .collect();
        assert_eq!(ranks, vec![2, 5, -1]);
    }

    #[tokio::test]
    async fn test_failed_fetch_clears_in_flight_and_retries() {
        let api = Arc::new(FakeLadderApi::new(100));
        api.fail_page(2);
        let cache = cache(&api);

        let err = resolve(cache.fetch(25)).await.expect_err("page 2 fails");
        assert!(!err.is_stale());
        assert!(cache.in_flight_pages().is_empty());
        assert!(cache.peek(25).is_none());

        api.heal_page(2);
        let row = resolve(cache.fetch(25)).await.expect("retry").expect("row");
        assert_eq!(row.rank, 26);
        assert_eq!(api.page_calls(), vec![2, 2]);
    }

    #[tokio::test]
    async fn test_panicking_fetch_clears_in_flight_and_retries() {
        let cache = RowCache::new(PanicOnce::default(), 20);

        let err = resolve(cache.fetch(25)).await.expect_err("first fetch panics");
        assert!(matches!(*err, Error::TaskFailed { page: 2, .. }));
        assert!(!err.is_stale());
        assert!(cache.in_flight_pages().is_empty());

        let row = resolve(cache.fetch(25)).await.expect("retry").expect("row");
        assert_eq!(row.rank, 26);
        assert_eq!(cache.source().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_completion_after_invalidate_is_discarded() {
        let source = HookedSource::default();
        let hook = Arc::clone(&source.on_complete);
        let cache = RowCache::new(source, 20);

        // The request finishes in the same poll that invalidates, so the
        // abort never gets a chance to stop the task before it stores.
        let handle = cache.clone();
        *hook.lock() = Some(Box::new(move || {
            handle.invalidate();
        }));

        let err = resolve(cache.fetch(25)).await.expect_err("stale completion");
        assert!(matches!(
            *err,
            Error::Invalidated {
                expected: 0,
                current: 1
            }
        ));
        assert_eq!(cache.generation(), 1);
        assert_eq!(cache.cached_rows(), 0);
        assert!(cache.peek(25).is_none());
        assert!(cache.in_flight_pages().is_empty());

        hook.lock().take();
        let row = resolve(cache.fetch(25)).await.expect("refetch").expect("row");
        assert_eq!(row.rank, 26);
        assert_eq!(cache.cached_rows(), 20);
    }

    #[tokio::test]
    async fn test_short_last_page() {
        let api = Arc::new(FakeLadderApi::new(45));
        let cache = cache(&api);

        let row = resolve(cache.fetch(44)).await.expect("fetch").expect("row");
        assert_eq!(row.rank, 45);
        assert_eq!(cache.cached_rows(), 5);

        // Still past the end once page 3 is known: the page is fetched again
        // because index 47 was never cached, and resolves to nothing.
        let missing = resolve(cache.fetch(47)).await.expect("fetch");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_prefetch_skips_cached_and_in_flight_pages() {
        let api = Arc::new(FakeLadderApi::new(100));
        api.hold();
        let cache = cache(&api);

        let _pending = cache.fetch(0);
        assert_eq!(cache.prefetch(0..50), 2);
        assert_eq!(cache.in_flight_pages(), vec![1, 2, 3]);
        assert_eq!(cache.prefetch(0..50), 0);

        api.release();
        let row = resolve(cache.fetch(45)).await.expect("fetch").expect("row");
        assert_eq!(row.rank, 46);
        assert_eq!(api.page_calls(), vec![1, 2, 3]);
    }
}
