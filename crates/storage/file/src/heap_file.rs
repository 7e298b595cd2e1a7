use crate::api::StorageFile;
use crate::storage_error::{StorageError, StorageResult};
use page::PAGE_SIZE;
use page::page::Page;
use page::page_id::{PageId, TableId};
use std::fs;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[cfg(unix)]
use std::os::unix::fs::FileExt;
#[cfg(windows)]
use std::os::windows::fs::FileExt;

/// A disk based heap file: page `n` of the table lives at byte offset `n * PAGE_SIZE`.
#[derive(Debug)]
pub struct HeapFile {
    table_id: TableId,
    path: PathBuf,
    file: File,
    /// Serializes appends so concurrent allocations get distinct page numbers.
    append_latch: Mutex<()>,
}

impl HeapFile {
    /// Opens (creating it if needed) the heap file at `path` for table `table_id`.
    pub fn open(table_id: TableId, path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let io_err = |source| StorageError::Io { table_id, source };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(io_err)?;

        tracing::debug!(table_id, path = %path.display(), "opened heap file");
        Ok(Self {
            table_id,
            path,
            file,
            append_latch: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn offset(page_id: PageId) -> u64 {
        (page_id.page_number as u64) * (PAGE_SIZE as u64)
    }

    fn io_err(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            table_id: self.table_id,
            source,
        }
    }

    fn check_in_range(&self, page_id: PageId) -> StorageResult<()> {
        self.check_owned(page_id)?;
        let page_count = self.page_count()?;
        if page_id.page_number >= page_count {
            return Err(StorageError::PageOutOfRange {
                page_id,
                page_count,
            });
        }
        Ok(())
    }

    fn write_bytes(&self, page_id: PageId, bytes: &[u8]) -> StorageResult<()> {
        let offset = Self::offset(page_id);
        let mut written = 0;
        while written < bytes.len() {
            let n = Self::write_at(&self.file, &bytes[written..], offset + written as u64)
                .map_err(|e| self.io_err(e))?;
            if n == 0 {
                return Err(self.io_err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!("wrote 0 bytes of page {page_id}"),
                )));
            }
            written += n;
        }
        Ok(())
    }

    #[inline]
    fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        #[cfg(unix)]
        {
            file.read_at(buf, offset)
        }

        #[cfg(windows)]
        {
            file.seek_read(buf, offset)
        }
    }

    #[inline]
    fn write_at(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
        #[cfg(unix)]
        {
            file.write_at(buf, offset)
        }

        #[cfg(windows)]
        {
            file.seek_write(buf, offset)
        }
    }
}

impl StorageFile for HeapFile {
    fn table_id(&self) -> TableId {
        self.table_id
    }

    fn page_count(&self) -> StorageResult<u32> {
        let len = self.file.metadata().map_err(|e| self.io_err(e))?.len();
        Ok((len / PAGE_SIZE as u64) as u32)
    }

    fn read_page(&self, page_id: PageId) -> StorageResult<Page> {
        self.check_in_range(page_id)?;

        let mut buf = vec![0u8; PAGE_SIZE];
        let offset = Self::offset(page_id);
        let mut read = 0;
        while read < PAGE_SIZE {
            let n = Self::read_at(&self.file, &mut buf[read..], offset + read as u64)
                .map_err(|e| self.io_err(e))?;
            if n == 0 {
                return Err(StorageError::ShortRead { page_id, read });
            }
            read += n;
        }

        tracing::trace!(%page_id, "read page from disk");
        Ok(Page::from_bytes(page_id, &buf)?)
    }

    fn write_page(&self, page: &Page) -> StorageResult<()> {
        let page_id = page.page_id();
        self.check_in_range(page_id)?;
        self.write_bytes(page_id, page.data())?;
        tracing::trace!(%page_id, "wrote page to disk");
        Ok(())
    }

    fn allocate_page(&self) -> StorageResult<PageId> {
        let _append = self
            .append_latch
            .lock()
            .expect("HeapFile poisoned: another thread panicked while holding the append latch");

        let page_id = self.page_id(self.page_count()?);
        self.write_bytes(page_id, &[0u8; PAGE_SIZE])?;
        tracing::debug!(%page_id, "allocated heap page");
        Ok(page_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use page::transaction_id::TransactionId;
    use tempfile::TempDir;

    fn open_in(dir: &TempDir) -> HeapFile {
        HeapFile::open(7, dir.path().join("data").join("t7.tbl")).unwrap()
    }

    #[test]
    fn open_creates_an_empty_file() {
        let dir = TempDir::new().unwrap();
        let file = open_in(&dir);
        assert!(file.path().exists());
        assert_eq!(file.page_count().unwrap(), 0);
    }

    #[test]
    fn allocate_appends_pages() {
        let dir = TempDir::new().unwrap();
        let file = open_in(&dir);

        assert_eq!(file.allocate_page().unwrap(), PageId::new(7, 0));
        assert_eq!(file.allocate_page().unwrap(), PageId::new(7, 1));
        assert_eq!(file.page_count().unwrap(), 2);
    }

    #[test]
    fn written_page_is_read_back_after_reopen() {
        let dir = TempDir::new().unwrap();
        let page_id = {
            let file = open_in(&dir);
            let page_id = file.allocate_page().unwrap();
            let mut page = file.read_page(page_id).unwrap();
            let rid = file
                .insert_tuple(TransactionId::new(), &mut page, b"hello")
                .unwrap()
                .unwrap();
            assert_eq!(rid.slot, 0);
            file.write_page(&page).unwrap();
            page_id
        };

        let file = open_in(&dir);
        let page = file.read_page(page_id).unwrap();
        assert_eq!(page.row(0).unwrap(), Some(&b"hello"[..]));
    }

    #[test]
    fn read_past_end_is_out_of_range() {
        let dir = TempDir::new().unwrap();
        let file = open_in(&dir);
        file.allocate_page().unwrap();

        let err = file.read_page(PageId::new(7, 3)).unwrap_err();
        assert!(matches!(
            err,
            StorageError::PageOutOfRange { page_count: 1, .. }
        ));
    }

    #[test]
    fn foreign_pages_are_rejected() {
        let dir = TempDir::new().unwrap();
        let file = open_in(&dir);
        file.allocate_page().unwrap();

        let err = file.read_page(PageId::new(8, 0)).unwrap_err();
        assert!(matches!(err, StorageError::ForeignPage { table_id: 7, .. }));
    }
}
