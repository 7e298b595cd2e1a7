use page::PAGE_SIZE;
use page::page_error::PageError;
use page::page_id::{PageId, TableId};

/// Errors surfaced by `StorageFile` implementations and the `Catalog`.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error on table {table_id}: {source}")]
    Io {
        table_id: TableId,
        source: std::io::Error,
    },
    #[error("short read of page {page_id}: got {read} of {PAGE_SIZE} bytes")]
    ShortRead { page_id: PageId, read: usize },
    #[error("page {page_id} is past the end of its table ({page_count} pages)")]
    PageOutOfRange { page_id: PageId, page_count: u32 },
    #[error("page {page_id} does not belong to table {table_id}")]
    ForeignPage { page_id: PageId, table_id: TableId },
    #[error("no room for a {len} byte row on page {page_id}")]
    NoRoom { page_id: PageId, len: usize },
    #[error("unknown table id {0}")]
    UnknownTable(TableId),
    #[error("unknown table name {0:?}")]
    UnknownTableName(String),
    #[error(transparent)]
    Page(#[from] PageError),
}

pub type StorageResult<T> = Result<T, StorageError>;
