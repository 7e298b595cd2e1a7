use page::page::Page;
use page::page_id::PageId;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared handle to a page held by the cache.
///
/// Cloning the handle is cheap. The handle stays valid after the entry is evicted or discarded,
/// but it then refers to a detached copy: fetch the page again to observe the current version.
/// Do not keep a guard alive across calls into the cache or the coordinator.
#[derive(Debug, Clone)]
pub struct CachedPage {
    page_id: PageId,
    inner: Arc<RwLock<Page>>,
}

impl CachedPage {
    pub(crate) fn new(page: Page) -> Self {
        Self {
            page_id: page.page_id(),
            inner: Arc::new(RwLock::new(page)),
        }
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Shared latch on the page contents.
    pub fn read(&self) -> PageReadGuard<'_> {
        PageReadGuard {
            guard: self.inner.read().expect("page latch poisoned"),
        }
    }

    /// Exclusive latch on the page contents.
    pub fn write(&self) -> PageWriteGuard<'_> {
        PageWriteGuard {
            guard: self.inner.write().expect("page latch poisoned"),
        }
    }

    /// Copy of the current page contents.
    pub fn snapshot(&self) -> Page {
        self.read().clone()
    }

    /// Whether both handles point at the same cache entry.
    pub fn same_entry(&self, other: &CachedPage) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Provides read access to a cached `Page`.
/// Shared latch, allowing concurrent reads.
/// Free as soon as possible.
#[derive(Debug)]
pub struct PageReadGuard<'a> {
    guard: RwLockReadGuard<'a, Page>,
}

impl Deref for PageReadGuard<'_> {
    type Target = Page;
    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

/// Provides write access to a cached `Page`.
/// Exclusive latch; the page lock protocol decides who may take it.
#[derive(Debug)]
pub struct PageWriteGuard<'a> {
    guard: RwLockWriteGuard<'a, Page>,
}

impl Deref for PageWriteGuard<'_> {
    type Target = Page;
    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl DerefMut for PageWriteGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}
