use crate::errors::CacheError;
use crate::frame::CacheEntry;
use crate::guards::CachedPage;
use page::page::Page;
use page::page_id::PageId;
use page::transaction_id::TransactionId;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

/// The state guarded by the cache mutex. Every insert, eviction and dirty-flag change happens
/// while it is held.
#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<PageId, CacheEntry>,
    /// Logical clock advanced on every access.
    clock: u64,
}

impl CacheState {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Evicts the least recently used clean entry. Dirty entries are never evicted (no-steal).
    fn evict_one(&mut self) -> Option<PageId> {
        let victim = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_dirty())
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(page_id, _)| *page_id)?;
        self.entries.remove(&victim);
        Some(victim)
    }
}

/// The bounded in-memory store of pages.
///
/// - Pages are loaded on a miss through a caller-provided loader (normally the owning
///   `StorageFile`), so the cache has no knowledge of where pages live.
/// - When a miss happens while the cache is full, the least recently used *clean* page is evicted.
///   If every cached page is dirty the request fails with [`CacheError::Exhausted`].
/// - Dirty pages are written back only through [`PageCache::flush`], [`PageCache::flush_for`] and
///   [`PageCache::flush_all`], again through a caller-provided writer.
#[derive(Debug)]
pub struct PageCache {
    capacity: NonZeroUsize,
    state: Mutex<CacheState>,
}

impl PageCache {
    /// Creates a new empty cache holding at most `capacity` pages.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Number of cached pages.
    pub fn len(&self) -> usize {
        self.lock_state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, page_id: PageId) -> bool {
        self.lock_state().entries.contains_key(&page_id)
    }

    /// Ids of all cached pages, in no particular order.
    pub fn cached_pages(&self) -> Vec<PageId> {
        self.lock_state().entries.keys().copied().collect()
    }

    /// `None` if the page is not cached, otherwise the page's dirty owner.
    pub fn dirty_owner(&self, page_id: PageId) -> Option<Option<TransactionId>> {
        self.lock_state()
            .entries
            .get(&page_id)
            .map(|entry| entry.dirty_owner)
    }

    /// Ids of the cached pages dirtied by `tid`.
    pub fn dirty_pages(&self, tid: TransactionId) -> Vec<PageId> {
        self.lock_state()
            .entries
            .iter()
            .filter(|(_, entry)| entry.dirty_owner == Some(tid))
            .map(|(page_id, _)| *page_id)
            .collect()
    }

    /// Retrieves a page from the cache. On a miss the page is loaded through `loader`, evicting a
    /// clean page first if the cache is full.
    pub fn get<E, L>(&self, page_id: PageId, loader: L) -> Result<CachedPage, E>
    where
        E: From<CacheError>,
        L: FnOnce(PageId) -> Result<Page, E>,
    {
        self.fetch(page_id, None, loader)
    }

    /// Same as [`PageCache::get`], and marks the page dirty for `tid` in the same critical
    /// section, so the page cannot be evicted between the fetch and the caller's write.
    pub fn get_for_write<E, L>(
        &self,
        page_id: PageId,
        tid: TransactionId,
        loader: L,
    ) -> Result<CachedPage, E>
    where
        E: From<CacheError>,
        L: FnOnce(PageId) -> Result<Page, E>,
    {
        self.fetch(page_id, Some(tid), loader)
    }

    /// Inserts `page`, or replaces the contents of the cached entry with the same id in place so
    /// outstanding handles observe the new version. `dirty_owner` becomes the entry's owner.
    pub fn put(
        &self,
        page: Page,
        dirty_owner: Option<TransactionId>,
    ) -> Result<CachedPage, CacheError> {
        let page_id = page.page_id();
        let mut state = self.lock_state();
        let now = state.tick();

        if let Some(entry) = state.entries.get_mut(&page_id) {
            *entry.page.write() = page;
            entry.dirty_owner = dirty_owner;
            entry.last_used = now;
            return Ok(entry.page.clone());
        }

        self.make_room(&mut state, page_id)?;
        let cached = CachedPage::new(page);
        state
            .entries
            .insert(page_id, CacheEntry::new(cached.clone(), dirty_owner, now));
        Ok(cached)
    }

    /// Drops the cached entry unconditionally, without flushing it.
    pub fn discard(&self, page_id: PageId) -> bool {
        let removed = self.lock_state().entries.remove(&page_id).is_some();
        if removed {
            tracing::debug!(%page_id, "discarded cached page");
        }
        removed
    }

    /// Drops every entry dirtied by `tid`, without flushing. Returns the discarded ids.
    pub fn discard_for(&self, tid: TransactionId) -> Vec<PageId> {
        let mut state = self.lock_state();
        let discarded: Vec<PageId> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.dirty_owner == Some(tid))
            .map(|(page_id, _)| *page_id)
            .collect();
        for page_id in &discarded {
            state.entries.remove(page_id);
        }
        if !discarded.is_empty() {
            tracing::debug!(%tid, pages = discarded.len(), "discarded dirty pages");
        }
        discarded
    }

    /// Writes the page back through `writer` if it is cached and dirty, then marks it clean.
    /// Returns whether a write happened.
    pub fn flush<E, W>(&self, page_id: PageId, mut writer: W) -> Result<bool, E>
    where
        W: FnMut(&Page) -> Result<(), E>,
    {
        self.flush_if(page_id, |_| true, &mut writer)
    }

    /// Flushes every dirty page. Iterates a snapshot of the cached ids, so pages inserted meanwhile
    /// are not visited. Every page is attempted; the first failure is returned at the end.
    ///
    /// This writes uncommitted data when other transactions are still running.
    pub fn flush_all<E, W>(&self, mut writer: W) -> Result<(), E>
    where
        W: FnMut(&Page) -> Result<(), E>,
    {
        let snapshot = self.cached_pages();
        self.flush_each(snapshot, |_| true, &mut writer)
    }

    /// Flushes every page dirtied by `tid`, best effort like [`PageCache::flush_all`].
    pub fn flush_for<E, W>(&self, tid: TransactionId, mut writer: W) -> Result<(), E>
    where
        W: FnMut(&Page) -> Result<(), E>,
    {
        let snapshot = self.dirty_pages(tid);
        self.flush_each(snapshot, |owner| owner == tid, &mut writer)
    }

    fn flush_each<E, W>(
        &self,
        page_ids: Vec<PageId>,
        owned: impl Fn(TransactionId) -> bool,
        writer: &mut W,
    ) -> Result<(), E>
    where
        W: FnMut(&Page) -> Result<(), E>,
    {
        let mut first_error = None;
        for page_id in page_ids {
            if let Err(e) = self.flush_if(page_id, &owned, writer) {
                tracing::warn!(%page_id, "failed to flush page");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Flushes one page if its dirty owner satisfies `owned`. The write happens under the cache
    /// mutex so the page cannot be evicted, replaced or re-dirtied half way through.
    fn flush_if<E, W>(
        &self,
        page_id: PageId,
        owned: impl Fn(TransactionId) -> bool,
        writer: &mut W,
    ) -> Result<bool, E>
    where
        W: FnMut(&Page) -> Result<(), E>,
    {
        let mut state = self.lock_state();
        let Some(entry) = state.entries.get_mut(&page_id) else {
            return Ok(false);
        };
        let Some(owner) = entry.dirty_owner.filter(|owner| owned(*owner)) else {
            return Ok(false);
        };

        writer(&*entry.page.read())?;
        entry.dirty_owner = None;
        tracing::debug!(%page_id, tid = %owner, "flushed page");
        Ok(true)
    }

    /// Shared logic for loading or returning a page from the cache.
    fn fetch<E, L>(
        &self,
        page_id: PageId,
        owner: Option<TransactionId>,
        loader: L,
    ) -> Result<CachedPage, E>
    where
        E: From<CacheError>,
        L: FnOnce(PageId) -> Result<Page, E>,
    {
        let mut state = self.lock_state();
        let now = state.tick();

        // Happiest of flows - the page is already cached.
        if let Some(entry) = state.entries.get_mut(&page_id) {
            entry.last_used = now;
            if let Some(tid) = owner {
                Self::mark_dirty(entry, page_id, tid);
            }
            return Ok(entry.page.clone());
        }

        // Cache miss: fail before loading when nothing can be evicted, and evict only once the
        // load succeeded. The state mutex is held throughout, so the victim cannot change.
        self.check_room(&state, page_id)?;
        let page = loader(page_id)?;
        self.make_room(&mut state, page_id)?;
        tracing::debug!(%page_id, "loaded page into cache");

        let cached = CachedPage::new(page);
        state
            .entries
            .insert(page_id, CacheEntry::new(cached.clone(), owner, now));
        Ok(cached)
    }

    fn mark_dirty(entry: &mut CacheEntry, page_id: PageId, tid: TransactionId) {
        if let Some(previous) = entry.dirty_owner.filter(|previous| *previous != tid) {
            tracing::warn!(%page_id, %previous, %tid, "page re-dirtied by another transaction");
        }
        entry.dirty_owner = Some(tid);
    }

    fn check_room(&self, state: &CacheState, for_page: PageId) -> Result<(), CacheError> {
        let full = state.entries.len() >= self.capacity.get();
        if full && state.entries.values().all(CacheEntry::is_dirty) {
            return Err(self.exhausted(for_page));
        }
        Ok(())
    }

    fn make_room(&self, state: &mut CacheState, for_page: PageId) -> Result<(), CacheError> {
        if state.entries.len() < self.capacity.get() {
            return Ok(());
        }
        match state.evict_one() {
            Some(victim) => {
                tracing::debug!(page_id = %victim, "evicted clean page");
                Ok(())
            }
            None => Err(self.exhausted(for_page)),
        }
    }

    fn exhausted(&self, page_id: PageId) -> CacheError {
        CacheError::Exhausted {
            capacity: self.capacity.get(),
            page_id,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state
            .lock()
            .expect("PageCache poisoned: another thread panicked while holding the lock")
    }
}

// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::RwLock;
    use std::thread;

    #[derive(Debug, thiserror::Error)]
    enum TestError {
        #[error(transparent)]
        Cache(#[from] CacheError),
        #[error("disk failure on {0}")]
        Disk(PageId),
    }

    /// Page store recording every request, standing in for a `StorageFile`.
    #[derive(Default)]
    struct MockStore {
        requested_pages: RwLock<Vec<PageId>>,
        written_pages: RwLock<Vec<PageId>>,
    }

    impl MockStore {
        fn load(&self, page_id: PageId) -> Result<Page, TestError> {
            self.requested_pages.write().unwrap().push(page_id);
            let mut page = Page::new_zeroed(page_id);
            page.data_mut()[0] = page_id.page_number as u8;
            Ok(page)
        }

        fn write(&self, page: &Page) -> Result<(), TestError> {
            self.written_pages.write().unwrap().push(page.page_id());
            Ok(())
        }

        fn loads(&self) -> usize {
            self.requested_pages.read().unwrap().len()
        }
    }

    fn cache_of(size: usize) -> PageCache {
        PageCache::new(NonZeroUsize::new(size).unwrap())
    }

    #[test]
    fn constructor_sets_fields() {
        let cache = cache_of(10);
        assert_eq!(cache.capacity(), 10);
        assert!(cache.is_empty());
    }

    #[test]
    fn get_not_cached_loads_once() {
        // Arrange
        let cache = cache_of(4);
        let store = MockStore::default();
        let page_id = PageId::new(1, 1);

        // Act
        let first = cache.get(page_id, |pid| store.load(pid)).unwrap();
        let second = cache.get(page_id, |pid| store.load(pid)).unwrap();

        // Assert
        assert_eq!(first.page_id(), page_id);
        assert_eq!(first.read().data()[0], 1);
        assert!(first.same_entry(&second));
        assert_eq!(store.loads(), 1);
        assert_eq!(cache.dirty_owner(page_id), Some(None));
    }

    #[test]
    fn loader_failure_leaves_cache_untouched() {
        let cache = cache_of(2);
        let page_id = PageId::new(1, 1);

        let result: Result<CachedPage, TestError> =
            cache.get(page_id, |pid| Err(TestError::Disk(pid)));

        assert!(matches!(result, Err(TestError::Disk(_))));
        assert!(!cache.contains(page_id));
    }

    #[test]
    fn failed_load_on_full_cache_evicts_nothing() {
        let cache = cache_of(1);
        let store = MockStore::default();
        let cached = PageId::new(1, 0);
        cache.get(cached, |pid| store.load(pid)).unwrap();

        let result: Result<CachedPage, TestError> =
            cache.get(PageId::new(1, 1), |pid| Err(TestError::Disk(pid)));

        assert!(matches!(result, Err(TestError::Disk(_))));
        assert!(cache.contains(cached));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn full_cache_evicts_least_recently_used_clean_page() {
        // Arrange: capacity 2, load A and B, touch A again
        let cache = cache_of(2);
        let store = MockStore::default();
        let (a, b, c) = (PageId::new(1, 0), PageId::new(1, 1), PageId::new(1, 2));
        cache.get(a, |pid| store.load(pid)).unwrap();
        cache.get(b, |pid| store.load(pid)).unwrap();
        cache.get(a, |pid| store.load(pid)).unwrap();

        // Act
        cache.get(c, |pid| store.load(pid)).unwrap();

        // Assert: B was the least recently used, A survives, B reloads on next access
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(a));
        assert!(!cache.contains(b));
        assert!(cache.contains(c));
        cache.get(b, |pid| store.load(pid)).unwrap();
        assert_eq!(store.loads(), 4);
    }

    #[test]
    fn dirty_pages_are_never_evicted() {
        let cache = cache_of(2);
        let store = MockStore::default();
        let tid = TransactionId::new();
        let (a, b, c) = (PageId::new(1, 0), PageId::new(1, 1), PageId::new(1, 2));
        cache.get_for_write(a, tid, |pid| store.load(pid)).unwrap();
        cache.get(b, |pid| store.load(pid)).unwrap();

        cache.get(c, |pid| store.load(pid)).unwrap();

        assert!(cache.contains(a));
        assert!(!cache.contains(b));
        assert_eq!(cache.dirty_owner(a), Some(Some(tid)));
    }

    #[test]
    fn all_dirty_cache_is_exhausted() {
        let cache = cache_of(1);
        let store = MockStore::default();
        let tid = TransactionId::new();
        cache
            .get_for_write(PageId::new(1, 0), tid, |pid| store.load(pid))
            .unwrap();

        let result = cache.get(PageId::new(1, 1), |pid| store.load(pid));

        assert!(matches!(
            result,
            Err(TestError::Cache(CacheError::Exhausted { capacity: 1, .. }))
        ));
        // the loader was never invoked for the page that did not fit
        assert_eq!(store.loads(), 1);
    }

    #[test]
    fn put_replaces_contents_in_place() {
        let cache = cache_of(2);
        let store = MockStore::default();
        let tid = TransactionId::new();
        let page_id = PageId::new(1, 3);
        let handle = cache.get(page_id, |pid| store.load(pid)).unwrap();

        let mut replacement = Page::new_zeroed(page_id);
        replacement.data_mut()[0] = 42;
        let returned = cache.put(replacement, Some(tid)).unwrap();

        assert!(returned.same_entry(&handle));
        assert_eq!(handle.read().data()[0], 42);
        assert_eq!(cache.dirty_owner(page_id), Some(Some(tid)));
    }

    #[test]
    fn put_new_page_respects_capacity() {
        let cache = cache_of(1);
        let tid = TransactionId::new();
        cache.put(Page::new_zeroed(PageId::new(1, 0)), Some(tid)).unwrap();

        let err = cache
            .put(Page::new_zeroed(PageId::new(1, 1)), None)
            .unwrap_err();
        assert!(matches!(err, CacheError::Exhausted { .. }));
    }

    #[test]
    fn flush_writes_only_dirty_pages_and_cleans_them() {
        let cache = cache_of(4);
        let store = MockStore::default();
        let tid = TransactionId::new();
        let (a, b) = (PageId::new(1, 0), PageId::new(1, 1));
        cache.get_for_write(a, tid, |pid| store.load(pid)).unwrap();
        cache.get(b, |pid| store.load(pid)).unwrap();

        assert!(cache.flush(a, |page| store.write(page)).unwrap());
        assert!(!cache.flush(b, |page| store.write(page)).unwrap());
        assert!(!cache.flush(PageId::new(9, 9), |page| store.write(page)).unwrap());

        assert_eq!(*store.written_pages.read().unwrap(), vec![a]);
        assert_eq!(cache.dirty_owner(a), Some(None));
    }

    #[test]
    fn flush_for_only_touches_the_owner_pages() {
        let cache = cache_of(4);
        let store = MockStore::default();
        let (t1, t2) = (TransactionId::new(), TransactionId::new());
        let (a, b) = (PageId::new(1, 0), PageId::new(1, 1));
        cache.get_for_write(a, t1, |pid| store.load(pid)).unwrap();
        cache.get_for_write(b, t2, |pid| store.load(pid)).unwrap();

        cache.flush_for(t1, |page| store.write(page)).unwrap();

        assert_eq!(*store.written_pages.read().unwrap(), vec![a]);
        assert_eq!(cache.dirty_owner(a), Some(None));
        assert_eq!(cache.dirty_owner(b), Some(Some(t2)));
    }

    #[test]
    fn flush_all_attempts_every_page_and_reports_first_failure() {
        let cache = cache_of(4);
        let store = MockStore::default();
        let tid = TransactionId::new();
        let pages = [PageId::new(1, 0), PageId::new(1, 1), PageId::new(1, 2)];
        for page_id in pages {
            cache.get_for_write(page_id, tid, |pid| store.load(pid)).unwrap();
        }

        let mut attempts = 0;
        let result = cache.flush_all(|page| {
            attempts += 1;
            if page.page_id() == pages[1] {
                Err(TestError::Disk(page.page_id()))
            } else {
                store.write(page)
            }
        });

        assert!(matches!(result, Err(TestError::Disk(pid)) if pid == pages[1]));
        assert_eq!(attempts, 3);
        assert_eq!(cache.dirty_owner(pages[1]), Some(Some(tid)));
        assert_eq!(cache.dirty_owner(pages[0]), Some(None));
    }

    #[test]
    fn discard_for_drops_only_the_owner_pages() {
        let cache = cache_of(4);
        let store = MockStore::default();
        let (t1, t2) = (TransactionId::new(), TransactionId::new());
        let (a, b, c) = (PageId::new(1, 0), PageId::new(1, 1), PageId::new(1, 2));
        cache.get_for_write(a, t1, |pid| store.load(pid)).unwrap();
        cache.get_for_write(b, t2, |pid| store.load(pid)).unwrap();
        cache.get(c, |pid| store.load(pid)).unwrap();

        assert_eq!(cache.discard_for(t1), vec![a]);
        assert!(!cache.contains(a));
        assert!(cache.contains(b));
        assert!(cache.contains(c));
        assert!(cache.discard(c));
        assert!(!cache.discard(c));
    }

    #[test]
    fn concurrent_gets_share_one_entry() {
        let cache = cache_of(8);
        let store = MockStore::default();
        let page_id = PageId::new(2, 2);

        let handles: Vec<CachedPage> = thread::scope(|s| {
            let workers: Vec<_> = (0..8)
                .map(|_| s.spawn(|| cache.get(page_id, |pid| store.load(pid)).unwrap()))
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        assert_eq!(store.loads(), 1);
        assert!(handles.windows(2).all(|w| w[0].same_entry(&w[1])));
    }
}
