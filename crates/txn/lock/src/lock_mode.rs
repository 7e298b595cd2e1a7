use std::fmt;

/// Mode of a page lock. `Write` is stronger than `Read`, which the derived ordering reflects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LockMode {
    /// Shared lock, any number of transactions may hold it together.
    Read,
    /// Exclusive lock, excludes every other transaction.
    Write,
}

impl LockMode {
    /// Whether a lock in `self` mode can coexist with a lock in `held` mode owned by a
    /// *different* transaction.
    pub fn compatible_with(self, held: LockMode) -> bool {
        self == LockMode::Read && held == LockMode::Read
    }
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockMode::Read => f.write_str("read"),
            LockMode::Write => f.write_str("write"),
        }
    }
}
