use crate::errors::{DbError, DbResult};
use crate::storage_manager::Permission;
use buffer::guards::{CachedPage, PageReadGuard, PageWriteGuard};
use page::page::Page;
use page::page_id::PageId;

/// A cached page as handed out by [`StorageManager::get_page`](crate::storage_manager::StorageManager::get_page).
///
/// The handle remembers the permission it was fetched with: only `ReadWrite` handles, whose page
/// is write-locked and marked dirty for the transaction, hand out a write latch.
#[derive(Debug, Clone)]
pub struct PageHandle {
    page: CachedPage,
    permission: Permission,
}

impl PageHandle {
    pub(crate) fn new(page: CachedPage, permission: Permission) -> Self {
        Self { page, permission }
    }

    pub fn page_id(&self) -> PageId {
        self.page.page_id()
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    /// Shared latch on the page contents.
    pub fn read(&self) -> PageReadGuard<'_> {
        self.page.read()
    }

    /// Exclusive latch on the page contents. Fails for pages fetched `ReadOnly`.
    pub fn write(&self) -> DbResult<PageWriteGuard<'_>> {
        match self.permission {
            Permission::ReadWrite => Ok(self.page.write()),
            Permission::ReadOnly => Err(DbError::ReadOnlyPage {
                page_id: self.page_id(),
            }),
        }
    }

    /// Copy of the current page contents.
    pub fn snapshot(&self) -> Page {
        self.page.snapshot()
    }

    /// Whether both handles point at the same cache entry.
    pub fn same_entry(&self, other: &PageHandle) -> bool {
        self.page.same_entry(&other.page)
    }
}
