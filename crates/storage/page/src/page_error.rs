use crate::page_id::PageId;
use binary_helpers::bin_error::BinaryError;
use binary_helpers::conversions::ConversionError;

/// Public facing error type returned by the page module.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("page buffer must be {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("empty rows cannot be stored")]
    EmptyRow,
    #[error("row of {len} bytes exceeds the largest row a page can hold ({max} bytes)")]
    RowTooLarge { len: usize, max: usize },
    #[error("slot {slot} is out of range on page {page_id} ({slot_count} slots)")]
    SlotOutOfRange {
        page_id: PageId,
        slot: u16,
        slot_count: u16,
    },
    #[error("slot {slot} on page {page_id} holds no row")]
    EmptySlot { page_id: PageId, slot: u16 },
    #[error("corrupt page {page_id}: {reason}")]
    Corrupt {
        page_id: PageId,
        reason: &'static str,
    },
    #[error(transparent)]
    Binary(#[from] BinaryError),
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// Public facing result type of page operations.
pub type PageResult<T> = Result<T, PageError>;
