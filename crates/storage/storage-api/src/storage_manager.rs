//! The storage manager
use crate::errors::DbResult;
use crate::page_handle::PageHandle;
use buffer::buffer::PageCache;
use file::api::StorageFile;
use file::catalog::Catalog;
use file::storage_error::StorageError;
use lock::lock_mode::LockMode;
use lock::lock_table::LockTable;
use page::page::Page;
use page::page_id::{PageId, TableId};
use page::record_id::RecordId;
use page::transaction_id::TransactionId;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use txn_log::TransactionLog;

/// Default number of pages the cache holds.
pub const DEFAULT_CACHE_PAGES: usize = 50;

/// Default time a lock request may block before the transaction is aborted.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(200);

/// Requested access to a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ReadOnly,
    ReadWrite,
}

impl Permission {
    pub fn lock_mode(self) -> LockMode {
        match self {
            Permission::ReadOnly => LockMode::Read,
            Permission::ReadWrite => LockMode::Write,
        }
    }
}

/// Construction-time parameters of the [`StorageManager`].
#[derive(Debug, Clone)]
pub struct StorageManagerConfig {
    /// Page cache capacity. Zero is treated as one.
    pub cache_pages: usize,
    /// How long a lock request may block.
    pub lock_timeout: Duration,
    /// How often a blocked lock request re-runs deadlock detection.
    pub lock_poll_interval: Duration,
}

impl Default for StorageManagerConfig {
    fn default() -> Self {
        Self {
            cache_pages: DEFAULT_CACHE_PAGES,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            lock_poll_interval: DEFAULT_LOCK_TIMEOUT / 10,
        }
    }
}

/// The storage manager
///
/// Mediates every page access of every transaction:
/// - `get_page` resolves the table, takes the page lock (blocking, possibly aborting) and then
///   fetches the page through the cache, loading it from the table's [`StorageFile`] on a miss.
///   The returned [`PageHandle`] only writes when fetched `ReadWrite`.
/// - `insert_tuple` / `delete_tuple` apply row changes to pages fetched under a write lock and
///   cache the new versions, dirty for the transaction.
/// - `transaction_complete_with` flushes (commit) or discards (abort) the transaction's pages,
///   then releases its locks.
///
/// Callers must drop page guards before calling back into the manager.
#[derive(Debug)]
pub struct StorageManager {
    catalog: Arc<Catalog>,
    log: Arc<dyn TransactionLog>,
    cache: PageCache,
    locks: LockTable,
    lock_timeout: Duration,
}

impl StorageManager {
    /// Creates a new instance of the `StorageManager`
    pub fn new(
        catalog: Arc<Catalog>,
        log: Arc<dyn TransactionLog>,
        config: StorageManagerConfig,
    ) -> Self {
        let capacity = NonZeroUsize::new(config.cache_pages).unwrap_or(NonZeroUsize::MIN);
        tracing::debug!(
            cache_pages = capacity.get(),
            lock_timeout = ?config.lock_timeout,
            "storage manager created"
        );
        Self {
            catalog,
            log,
            cache: PageCache::new(capacity),
            locks: LockTable::new(config.lock_poll_interval),
            lock_timeout: config.lock_timeout,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Read access to the cache, for inspection.
    pub fn page_cache(&self) -> &PageCache {
        &self.cache
    }

    /// Writes the begin record for `tid`.
    pub fn begin_transaction(&self, tid: TransactionId) -> DbResult<()> {
        self.log.log_begin(tid)?;
        tracing::debug!(%tid, "transaction started");
        Ok(())
    }

    /// Locks `page_id` for `tid` with the mode `permission` requires, then returns the cached page.
    ///
    /// Blocks while another transaction holds a conflicting lock. Fails with
    /// [`DbError::Aborted`](crate::errors::DbError::Aborted) on deadlock or timeout, after which the
    /// caller must abort `tid`. `ReadWrite` marks the page dirty for `tid`; a `ReadOnly` handle
    /// refuses to hand out a write latch. An unknown table fails before any lock is taken.
    pub fn get_page(
        &self,
        tid: TransactionId,
        page_id: PageId,
        permission: Permission,
    ) -> DbResult<PageHandle> {
        let file = self.catalog.database_file(page_id.table_id)?;

        self.locks
            .acquire(tid, page_id, permission.lock_mode(), self.lock_timeout)?;

        let loader = |page_id: PageId| -> DbResult<Page> { Ok(file.read_page(page_id)?) };
        let cached = match permission {
            Permission::ReadOnly => self.cache.get(page_id, loader)?,
            Permission::ReadWrite => self.cache.get_for_write(page_id, tid, loader)?,
        };
        Ok(PageHandle::new(cached, permission))
    }

    /// Adds `row` to table `table_id` on behalf of `tid`.
    ///
    /// Takes the first page with room, trying existing pages in order under a read lock and
    /// upgrading on the chosen one. Read locks on pages without room are released again unless
    /// `tid` held them before. When no page has room a new page is appended to the table.
    pub fn insert_tuple(
        &self,
        tid: TransactionId,
        table_id: TableId,
        row: &[u8],
    ) -> DbResult<RecordId> {
        let file = self.catalog.database_file(table_id)?;

        for page_number in 0..file.page_count()? {
            let page_id = file.page_id(page_number);
            let held_before = self.locks.holds(tid, page_id);

            let cached = self.get_page(tid, page_id, Permission::ReadOnly)?;
            let has_room = file.has_room(&cached.read(), row)?;
            if !has_room {
                if !held_before {
                    self.locks.release(tid, page_id);
                }
                continue;
            }

            if let Some(record_id) = self.insert_into(tid, &*file, page_id, row)? {
                return Ok(record_id);
            }
        }

        let page_id = file.allocate_page()?;
        tracing::debug!(%tid, %page_id, "allocated page for insert");
        self.insert_into(tid, &*file, page_id, row)?
            .ok_or_else(|| {
                StorageError::NoRoom {
                    page_id,
                    len: row.len(),
                }
                .into()
            })
    }

    /// Removes the row at `record_id` on behalf of `tid`.
    pub fn delete_tuple(&self, tid: TransactionId, record_id: RecordId) -> DbResult<()> {
        let file = self.catalog.database_file(record_id.page_id.table_id)?;
        let cached = self.get_page(tid, record_id.page_id, Permission::ReadWrite)?;

        let mut page = cached.snapshot();
        file.delete_tuple(tid, &mut page, record_id)?;
        self.cache.put(page, Some(tid))?;
        tracing::trace!(%tid, %record_id, "row deleted");
        Ok(())
    }

    /// Releases `tid`'s lock on `page_id` before the transaction ends. This breaks two-phase
    /// locking and is only safe for pages the transaction did not read data from.
    pub fn release_page(&self, tid: TransactionId, page_id: PageId) {
        self.locks.release(tid, page_id);
    }

    pub fn holds_lock(&self, tid: TransactionId, page_id: PageId) -> bool {
        self.locks.holds(tid, page_id)
    }

    /// Commits `tid`.
    pub fn transaction_complete(&self, tid: TransactionId) -> DbResult<()> {
        self.transaction_complete_with(tid, true)
    }

    /// Commits or aborts `tid`. Every lock held by `tid` is released whatever the outcome.
    ///
    /// Commit writes every page dirtied by `tid` and then the commit record. If a page cannot be
    /// written, every page `tid` write-locked is dropped from the cache, an abort record is written
    /// and the first write failure is returned. The pages written before the failure stay on disk:
    /// such a commit is partial, and undoing it is left to recovery.
    ///
    /// Abort writes the abort record and drops every page `tid` write-locked from the cache,
    /// including pages already written by [`StorageManager::flush_pages`], so the next reader
    /// reloads them from their table.
    pub fn transaction_complete_with(&self, tid: TransactionId, commit: bool) -> DbResult<()> {
        let outcome = if commit {
            self.commit_pages(tid)
        } else {
            self.abort_pages(tid)
        };

        let released = self.locks.release_all(tid);
        match &outcome {
            Ok(()) => tracing::debug!(%tid, commit, released, "transaction completed"),
            Err(e) => tracing::warn!(%tid, commit, released, error = %e, "transaction completed with error"),
        }
        outcome
    }

    /// Writes every dirty page to its table. Writes uncommitted data of running transactions.
    pub fn flush_all_pages(&self) -> DbResult<()> {
        self.cache.flush_all(|page| self.write_page(page))
    }

    /// Writes every page dirtied by `tid`.
    pub fn flush_pages(&self, tid: TransactionId) -> DbResult<()> {
        self.cache.flush_for(tid, |page| self.write_page(page))
    }

    /// Drops `page_id` from the cache without writing it. Returns whether it was cached.
    pub fn discard_page(&self, page_id: PageId) -> bool {
        self.cache.discard(page_id)
    }

    pub fn is_cached(&self, page_id: PageId) -> bool {
        self.cache.contains(page_id)
    }

    pub fn cached_pages(&self) -> Vec<PageId> {
        self.cache.cached_pages()
    }

    fn insert_into(
        &self,
        tid: TransactionId,
        file: &dyn StorageFile,
        page_id: PageId,
        row: &[u8],
    ) -> DbResult<Option<RecordId>> {
        let cached = self.get_page(tid, page_id, Permission::ReadWrite)?;

        let mut page = cached.snapshot();
        let Some(record_id) = file.insert_tuple(tid, &mut page, row)? else {
            return Ok(None);
        };
        self.cache.put(page, Some(tid))?;
        tracing::trace!(%tid, %record_id, "row inserted");
        Ok(Some(record_id))
    }

    fn commit_pages(&self, tid: TransactionId) -> DbResult<()> {
        match self.flush_pages(tid) {
            Ok(()) => Ok(self.log.log_commit(tid)?),
            Err(flush_error) => {
                let discarded = self.discard_written(tid);
                tracing::warn!(%tid, discarded, error = %flush_error, "commit failed, rolling back");
                if let Err(log_error) = self.log.log_abort(tid) {
                    tracing::warn!(%tid, error = %log_error, "failed to log abort");
                }
                Err(flush_error)
            }
        }
    }

    fn abort_pages(&self, tid: TransactionId) -> DbResult<()> {
        let logged = self.log.log_abort(tid);
        let discarded = self.discard_written(tid);
        tracing::debug!(%tid, discarded, "discarded pages of aborted transaction");
        Ok(logged?)
    }

    /// Drops every page `tid` dirtied or write-locked. A page flushed mid-transaction is clean but
    /// still holds `tid`'s uncommitted version, which only its write lock still reveals.
    /// Returns the number of entries dropped.
    fn discard_written(&self, tid: TransactionId) -> usize {
        let dirty = self.cache.discard_for(tid).len();
        let flushed = self
            .locks
            .write_locked_pages(tid)
            .into_iter()
            .filter(|page_id| self.cache.discard(*page_id))
            .count();
        dirty + flushed
    }

    fn write_page(&self, page: &Page) -> DbResult<()> {
        let file = self.catalog.database_file(page.page_id().table_id)?;
        file.write_page(page)?;
        Ok(())
    }
}
