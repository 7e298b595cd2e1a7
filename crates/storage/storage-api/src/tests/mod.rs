use crate::storage_manager::{StorageManager, StorageManagerConfig};
use file::api::StorageFile;
use file::catalog::Catalog;
use file::memory_heap_file::MemoryHeapFile;
use file::storage_error::{StorageError, StorageResult};
use page::page::Page;
use page::page_id::{PageId, TableId};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use txn_log::memory_log::MemoryLog;


pub(super) const TABLE: TableId = 1;

/// A manager over one in-memory table, with handles on its collaborators for assertions.
pub(super) struct Fixture {
    pub(super) manager: StorageManager,
    pub(super) file: Arc<MemoryHeapFile>,
    pub(super) log: Arc<MemoryLog>,
}

pub(super) fn test_config(cache_pages: usize) -> StorageManagerConfig {
    StorageManagerConfig {
        cache_pages,
        lock_timeout: Duration::from_secs(2),
        lock_poll_interval: Duration::from_millis(5),
    }
}

/// A fixture whose table starts with `pages` empty pages.
pub(super) fn fixture(pages: u32, config: StorageManagerConfig) -> Fixture {
    let file = Arc::new(MemoryHeapFile::with_pages(TABLE, pages));
    let log = Arc::new(MemoryLog::new());
    let catalog = Catalog::new();
    catalog.add_table(file.clone(), "accounts");

    Fixture {
        manager: StorageManager::new(Arc::new(catalog), log.clone(), config),
        file,
        log,
    }
}

pub(super) fn pid(page_number: u32) -> PageId {
    PageId::new(TABLE, page_number)
}

/// Live rows of the persisted version of `page_id`.
pub(super) fn persisted_rows(file: &dyn StorageFile, page_id: PageId) -> Vec<Vec<u8>> {
    let page = file.read_page(page_id).unwrap();
    page.rows()
        .unwrap()
        .into_iter()
        .map(|(_, row)| row.to_vec())
        .collect()
}

/// Table whose writes to the listed pages fail.
#[derive(Debug)]
pub(super) struct FailingFile {
    pub(super) inner: MemoryHeapFile,
    pub(super) failing_pages: HashSet<u32>,
}

impl StorageFile for FailingFile {
    fn table_id(&self) -> TableId {
        self.inner.table_id()
    }

    fn page_count(&self) -> StorageResult<u32> {
        self.inner.page_count()
    }

    fn read_page(&self, page_id: PageId) -> StorageResult<Page> {
        self.inner.read_page(page_id)
    }

    fn write_page(&self, page: &Page) -> StorageResult<()> {
        if self.failing_pages.contains(&page.page_id().page_number) {
            return Err(StorageError::Io {
                table_id: self.table_id(),
                source: std::io::Error::other("disk full"),
            });
        }
        self.inner.write_page(page)
    }

    fn allocate_page(&self) -> StorageResult<PageId> {
        self.inner.allocate_page()
    }
}
