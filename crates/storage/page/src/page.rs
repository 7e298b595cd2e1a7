use crate::PAGE_SIZE;
use crate::page_error::{PageError, PageResult};
use crate::page_id::PageId;

/// Wrapper around a fixed-size byte array representing a page.
///
/// The page itself never interprets its bytes; formats such as the slotted heap layout in
/// [`crate::heap`] are layered on top of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Unique identifier of the page.
    page_id: PageId,
    /// Main binary array holding the `PAGE_SIZE` bytes of data for the page. Boxed and owned by this struct.
    data: Box<[u8; PAGE_SIZE]>,
}

impl Page {
    /// Creates a page whose bytes are all zero. A zeroed page is a valid empty heap page.
    pub fn new_zeroed(page_id: PageId) -> Self {
        Self {
            page_id,
            data: Box::new([0u8; PAGE_SIZE]),
        }
    }

    /// Creates a page by copying `bytes`, which must be exactly `PAGE_SIZE` long.
    pub fn from_bytes(page_id: PageId, bytes: &[u8]) -> PageResult<Self> {
        let data: Box<[u8; PAGE_SIZE]> = bytes
            .to_vec()
            .into_boxed_slice()
            .try_into()
            .map_err(|_| PageError::SizeMismatch {
                expected: PAGE_SIZE,
                actual: bytes.len(),
            })?;
        Ok(Self { page_id, data })
    }

    /// Returns the unique identifier of the page.
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn data(&self) -> &[u8; PAGE_SIZE] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8; PAGE_SIZE] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_zeroed_page() {
        let page = Page::new_zeroed(PageId::new(1, 0));
        assert_eq!(page.page_id(), PageId::new(1, 0));
        assert!(page.data().iter().all(|b| *b == 0));
    }

    #[test]
    fn from_bytes_copies_contents() {
        let page = Page::from_bytes(PageId::new(1, 1), &[5u8; PAGE_SIZE]).unwrap();
        assert_eq!(page.data()[..], [5u8; PAGE_SIZE][..]);
    }

    #[test]
    fn from_bytes_rejects_wrong_size() {
        let err = Page::from_bytes(PageId::new(1, 1), &[0u8; 100]).unwrap_err();
        assert!(matches!(
            err,
            PageError::SizeMismatch {
                expected: PAGE_SIZE,
                actual: 100
            }
        ));
    }
}
