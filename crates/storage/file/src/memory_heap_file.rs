use crate::api::StorageFile;
use crate::storage_error::{StorageError, StorageResult};
use page::PAGE_SIZE;
use page::page::Page;
use page::page_id::{PageId, TableId};
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A heap file kept entirely in memory. Counts page reads and writes so callers can observe
/// cache hits and flushes.
#[derive(Debug)]
pub struct MemoryHeapFile {
    table_id: TableId,
    pages: RwLock<Vec<Box<[u8; PAGE_SIZE]>>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryHeapFile {
    pub fn new(table_id: TableId) -> Self {
        Self::with_pages(table_id, 0)
    }

    /// Creates a file that already holds `page_count` empty pages.
    pub fn with_pages(table_id: TableId, page_count: u32) -> Self {
        let pages = (0..page_count)
            .map(|_| Box::new([0u8; PAGE_SIZE]))
            .collect();
        Self {
            table_id,
            pages: RwLock::new(pages),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of `read_page` calls served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of `write_page` calls served so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    fn slot_index(&self, page_id: PageId, page_count: usize) -> StorageResult<usize> {
        self.check_owned(page_id)?;
        let index = page_id.page_number as usize;
        if index >= page_count {
            return Err(StorageError::PageOutOfRange {
                page_id,
                page_count: page_count as u32,
            });
        }
        Ok(index)
    }
}

impl StorageFile for MemoryHeapFile {
    fn table_id(&self) -> TableId {
        self.table_id
    }

    fn page_count(&self) -> StorageResult<u32> {
        Ok(self.pages.read().expect("MemoryHeapFile poisoned").len() as u32)
    }

    fn read_page(&self, page_id: PageId) -> StorageResult<Page> {
        let pages = self.pages.read().expect("MemoryHeapFile poisoned");
        let index = self.slot_index(page_id, pages.len())?;
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(Page::from_bytes(page_id, &pages[index][..])?)
    }

    fn write_page(&self, page: &Page) -> StorageResult<()> {
        let mut pages = self.pages.write().expect("MemoryHeapFile poisoned");
        let index = self.slot_index(page.page_id(), pages.len())?;
        pages[index].copy_from_slice(page.data());
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn allocate_page(&self) -> StorageResult<PageId> {
        let mut pages = self.pages.write().expect("MemoryHeapFile poisoned");
        pages.push(Box::new([0u8; PAGE_SIZE]));
        Ok(self.page_id(pages.len() as u32 - 1))
    }
}
