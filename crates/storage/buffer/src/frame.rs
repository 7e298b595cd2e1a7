use crate::guards::CachedPage;
use page::transaction_id::TransactionId;

/// A cache entry: the shared page handle plus the metadata the cache needs for eviction.
///
/// Entries are only touched while the cache's state mutex is held.
#[derive(Debug)]
pub(crate) struct CacheEntry {
    /// The cached page.
    pub(crate) page: CachedPage,

    /// Transaction that last wrote the page, `None` while the page is clean.
    /// A dirty entry is never selected for eviction.
    pub(crate) dirty_owner: Option<TransactionId>,

    /// Logical timestamp of the last access, used to pick the least recently used clean entry.
    pub(crate) last_used: u64,
}

impl CacheEntry {
    pub(crate) fn new(page: CachedPage, dirty_owner: Option<TransactionId>, now: u64) -> Self {
        Self {
            page,
            dirty_owner,
            last_used: now,
        }
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty_owner.is_some()
    }
}
