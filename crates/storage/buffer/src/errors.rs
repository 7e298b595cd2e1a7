use page::page_id::PageId;

/// Page cache error.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The cache is full and every cached page is dirty, so nothing can be evicted without
    /// stealing uncommitted data. Retrying only helps after some transaction completes.
    #[error("page cache exhausted: all {capacity} cached pages are dirty, cannot load {page_id}")]
    Exhausted { capacity: usize, page_id: PageId },
}
