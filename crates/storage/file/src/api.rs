//! Public API for the `file` crate

use crate::storage_error::{StorageError, StorageResult};
use page::page::Page;
use page::page_id::{PageId, TableId};
use page::record_id::RecordId;
use page::transaction_id::TransactionId;
use std::fmt::Debug;

/// Per-table page store.
///
/// A `StorageFile` manages the fixed-size pages of one table and owns their on-disk layout. The
/// coordinator never interprets page bytes: it fetches pages under the right lock and hands them to
/// the row mutators below, which apply the file's row format. The default mutators use the slotted
/// heap format from [`page::heap`].
pub trait StorageFile: Send + Sync + Debug {
    /// Identifier of the table stored in this file.
    fn table_id(&self) -> TableId;

    /// Number of pages currently in the file.
    fn page_count(&self) -> StorageResult<u32>;

    /// Reads the page identified by `page_id`. Reading past the end of the file is an error.
    fn read_page(&self, page_id: PageId) -> StorageResult<Page>;

    /// Persists the contents of `page` at its position in the file.
    fn write_page(&self, page: &Page) -> StorageResult<()>;

    /// Appends a new empty page to the file and returns its id.
    fn allocate_page(&self) -> StorageResult<PageId>;

    /// The id of page `page_number` of this table.
    fn page_id(&self, page_number: u32) -> PageId {
        PageId::new(self.table_id(), page_number)
    }

    /// Whether `row` fits on `page` without touching it.
    fn has_room(&self, page: &Page, row: &[u8]) -> StorageResult<bool> {
        self.check_owned(page.page_id())?;
        Page::check_row(row)?;
        Ok(page.fits(row.len())?)
    }

    /// Stores `row` on `page` on behalf of `tid`. Returns `None` if the page has no room.
    fn insert_tuple(
        &self,
        _tid: TransactionId,
        page: &mut Page,
        row: &[u8],
    ) -> StorageResult<Option<RecordId>> {
        self.check_owned(page.page_id())?;
        let slot = page.insert_row(row)?;
        Ok(slot.map(|slot| RecordId::new(page.page_id(), slot)))
    }

    /// Removes the row at `record_id` from `page` on behalf of `tid`.
    fn delete_tuple(
        &self,
        _tid: TransactionId,
        page: &mut Page,
        record_id: RecordId,
    ) -> StorageResult<()> {
        self.check_owned(record_id.page_id)?;
        if record_id.page_id != page.page_id() {
            return Err(StorageError::ForeignPage {
                page_id: page.page_id(),
                table_id: self.table_id(),
            });
        }
        page.delete_row(record_id.slot)?;
        Ok(())
    }

    /// Fails unless `page_id` belongs to this table.
    fn check_owned(&self, page_id: PageId) -> StorageResult<()> {
        if page_id.table_id != self.table_id() {
            return Err(StorageError::ForeignPage {
                page_id,
                table_id: self.table_id(),
            });
        }
        Ok(())
    }
}
