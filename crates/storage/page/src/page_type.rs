use std::fmt;

/// Enumeration of the page categories in the storage system.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageType {
    /// Slotted heap data page.
    Heap = 1,
    /// B+ tree index root page.
    IndexRoot = 2,
    /// B+ tree index internal page.
    IndexInternal = 3,
    /// B+ tree index leaf data page.
    IndexLeaf = 4,
}

impl From<PageType> for u16 {
    fn from(p: PageType) -> Self {
        p as u16
    }
}

impl TryFrom<u16> for PageType {
    type Error = u16;

    /// Attempts to convert a `u16` value to its `PageType`. The unknown value is returned on failure.
    fn try_from(v: u16) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(PageType::Heap),
            2 => Ok(PageType::IndexRoot),
            3 => Ok(PageType::IndexInternal),
            4 => Ok(PageType::IndexLeaf),
            other => Err(other),
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PageType::Heap => "heap",
            PageType::IndexRoot => "index-root",
            PageType::IndexInternal => "index-internal",
            PageType::IndexLeaf => "index-leaf",
        };
        f.write_str(name)
    }
}
