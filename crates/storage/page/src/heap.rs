//! Slotted heap row format.
//!
//! ```text
//!   ┌──────────────────────────────────────────────┐
//!   │ Header: slot_count (u16) | free_start (u16)  │
//!   ├──────────────────────────────────────────────┤
//!   │ Row data (grows upward)                      │
//!   ├──────────────────────────────────────────────┤
//!   │ Free space                                   │
//!   ├──────────────────────────────────────────────┤
//!   │ Slot array (grows downward), SLOT_SIZE each: │
//!   │   offset (u16) | length (u16)                │
//!   └──────────────────────────────────────────────┘
//! ```
//!
//! A `free_start` of 0 means "immediately after the header", so a zeroed page is an empty heap
//! page. Deleted rows leave a tombstoned slot (offset 0, length 0) and slots are never reused,
//! which keeps every `RecordId` stable for the page's lifetime.

use crate::PAGE_SIZE;
use crate::page::Page;
use crate::page_error::{PageError, PageResult};
use binary_helpers::conversions::UsizeConversion;
use binary_helpers::le::{range, range_mut, read_le, write_le};
use paste::paste;

/// Size of the heap header in bytes.
pub const HEADER_SIZE: usize = 4;

/// Size of one slot array entry in bytes.
pub const SLOT_SIZE: usize = 4;

/// Largest row a single heap page can hold.
pub const MAX_ROW_SIZE: usize = PAGE_SIZE - HEADER_SIZE - SLOT_SIZE;

/// Defines header field offset constants and getter/setter methods on `Page`.
///
/// Pattern: `field_name: field_type = field_offset;`
macro_rules! impl_heap_header_fields {
    ( $( $field_name:ident : $field_type:ty = $field_offset:expr ; )* ) => {
        paste! {
            $(
                #[doc = concat!("Offset of ", stringify!($field_name), " in the heap header")]
                pub(crate) const [<$field_name:upper>]: usize = $field_offset;

                impl Page {
                    fn [<get_ $field_name>](&self) -> PageResult<$field_type> {
                        Ok(read_le::<$field_type>(self.data(), [<$field_name:upper>])?)
                    }

                    fn [<set_ $field_name>](&mut self, val: $field_type) -> PageResult<()> {
                        write_le::<$field_type>(self.data_mut(), [<$field_name:upper>], val)?;
                        Ok(())
                    }
                }
            )*
        }
    };
}

impl_heap_header_fields! {
    slot_count : u16 = 0;
    free_start : u16 = 2;
}

/// Heap format operations.
impl Page {
    /// Number of slots ever allocated on this page, live or tombstoned.
    pub fn slot_count(&self) -> PageResult<u16> {
        self.get_slot_count()
    }

    /// Contiguous free bytes between the row data and the slot array.
    pub fn free_space(&self) -> PageResult<usize> {
        let (free_start, slots_start) = self.free_region()?;
        Ok(slots_start - free_start)
    }

    /// Whether a row of `len` bytes (plus its slot) fits on this page.
    pub fn fits(&self, len: usize) -> PageResult<bool> {
        Ok(len + SLOT_SIZE <= self.free_space()?)
    }

    /// Appends `row` to the page. Returns the new slot, or `None` if the row does not fit.
    pub fn insert_row(&mut self, row: &[u8]) -> PageResult<Option<u16>> {
        Self::check_row(row)?;
        if !self.fits(row.len())? {
            return Ok(None);
        }

        let (free_start, _) = self.free_region()?;
        let slot = self.get_slot_count()?;
        range_mut(self.data_mut(), free_start, row.len())?.copy_from_slice(row);

        let slot_offset = Self::slot_offset(slot);
        write_le::<u16>(self.data_mut(), slot_offset, free_start.to_u16()?)?;
        write_le::<u16>(self.data_mut(), slot_offset + 2, row.len().to_u16()?)?;

        self.set_slot_count(slot + 1)?;
        self.set_free_start((free_start + row.len()).to_u16()?)?;
        Ok(Some(slot))
    }

    /// Returns the row stored in `slot`, or `None` if the row was deleted.
    pub fn row(&self, slot: u16) -> PageResult<Option<&[u8]>> {
        let (offset, len) = self.slot(slot)?;
        if len == 0 {
            return Ok(None);
        }
        Ok(Some(range(self.data(), offset, len)?))
    }

    /// Tombstones the row stored in `slot`.
    pub fn delete_row(&mut self, slot: u16) -> PageResult<()> {
        let (_, len) = self.slot(slot)?;
        if len == 0 {
            return Err(PageError::EmptySlot {
                page_id: self.page_id(),
                slot,
            });
        }

        let slot_offset = Self::slot_offset(slot);
        write_le::<u16>(self.data_mut(), slot_offset, 0)?;
        write_le::<u16>(self.data_mut(), slot_offset + 2, 0)?;
        Ok(())
    }

    /// All live rows on the page, in slot order.
    pub fn rows(&self) -> PageResult<Vec<(u16, &[u8])>> {
        let mut rows = Vec::new();
        for slot in 0..self.get_slot_count()? {
            if let Some(row) = self.row(slot)? {
                rows.push((slot, row));
            }
        }
        Ok(rows)
    }

    /// Rejects rows the heap format can never store, whatever the page's free space.
    pub fn check_row(row: &[u8]) -> PageResult<()> {
        if row.is_empty() {
            return Err(PageError::EmptyRow);
        }
        if row.len() > MAX_ROW_SIZE {
            return Err(PageError::RowTooLarge {
                len: row.len(),
                max: MAX_ROW_SIZE,
            });
        }
        Ok(())
    }

    /// Returns `(free_start, slot_array_start)`, validating the header against the page size.
    fn free_region(&self) -> PageResult<(usize, usize)> {
        let slot_count = self.get_slot_count()? as usize;
        let free_start = match self.get_free_start()? as usize {
            0 => HEADER_SIZE,
            n => n,
        };

        let slots_start = PAGE_SIZE
            .checked_sub(slot_count * SLOT_SIZE)
            .ok_or(self.corrupt("slot array larger than the page"))?;
        if free_start < HEADER_SIZE || free_start > slots_start {
            return Err(self.corrupt("free space pointer overlaps the slot array"));
        }
        Ok((free_start, slots_start))
    }

    fn slot(&self, slot: u16) -> PageResult<(usize, usize)> {
        let slot_count = self.get_slot_count()?;
        if slot >= slot_count {
            return Err(PageError::SlotOutOfRange {
                page_id: self.page_id(),
                slot,
                slot_count,
            });
        }

        let slot_offset = Self::slot_offset(slot);
        let offset = read_le::<u16>(self.data(), slot_offset)? as usize;
        let len = read_le::<u16>(self.data(), slot_offset + 2)? as usize;
        Ok((offset, len))
    }

    fn slot_offset(slot: u16) -> usize {
        PAGE_SIZE - (slot as usize + 1) * SLOT_SIZE
    }

    fn corrupt(&self, reason: &'static str) -> PageError {
        PageError::Corrupt {
            page_id: self.page_id(),
            reason,
        }
    }
}
