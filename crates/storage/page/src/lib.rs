//! This crate provides the identifiers shared by the whole engine and the fixed-size `Page`.

/// Slotted heap row format applied on top of a `Page`.
pub mod heap;

/// Fixed-size page buffer.
pub mod page;

pub mod page_error;

/// Unique identifier for pages.
pub mod page_id;

/// Different categories of pages supported.
pub mod page_type;

/// Location of a row inside a table.
pub mod record_id;

/// Unique identifier for transactions.
pub mod transaction_id;

/// Fixed-size of a page in bytes
pub const PAGE_SIZE: usize = 4096;
