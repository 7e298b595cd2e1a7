use crate::page_type::PageType;
use std::fmt;

/// Identifier of a table, which is at its core just a u32
pub type TableId = u32;

/// A unique identifier for any page in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageId {
    /// Table owning the page.
    pub table_id: TableId,

    /// The specific page number within the table's file.
    pub page_number: u32,

    /// Category of the page.
    pub page_type: PageType,
}

impl PageId {
    /// Creates a new heap `PageId` with the given table ID and page number.
    pub fn new(table_id: TableId, page_number: u32) -> Self {
        Self::with_type(table_id, page_number, PageType::Heap)
    }

    /// Creates a new `PageId` of an explicit page category.
    pub fn with_type(table_id: TableId, page_number: u32, page_type: PageType) -> Self {
        Self {
            table_id,
            page_number,
            page_type,
        }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.table_id, self.page_number)
    }
}
