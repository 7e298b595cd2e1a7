use crate::lock_table::LockTable;
use page::page_id::PageId;
use std::time::Duration;


/// Timeout long enough that no test request should ever hit it unless it is really stuck.
pub(super) const LONG_WAIT: Duration = Duration::from_secs(5);

/// Returns a lock table with a short poll interval so deadlock tests converge quickly.
#[cfg(test)]
pub(super) fn test_table() -> LockTable {
    LockTable::new(Duration::from_millis(5))
}

#[cfg(test)]
pub(super) fn page(page_number: u32) -> PageId {
    PageId::new(7, page_number)
}

/// Helpers to break a `LockError` apart during assertions.
#[cfg(test)]
mod tests_error_helpers {
    use crate::errors::LockError;
    use page::transaction_id::TransactionId;
    use std::time::Duration;

    impl LockError {
        #[track_caller]
        pub fn expect_deadlock(&self) -> &[TransactionId] {
            match self {
                LockError::Deadlock { cycle, .. } => cycle,
                other => panic!("expected LockError::Deadlock, got {other:?}"),
            }
        }

        #[track_caller]
        pub fn expect_timeout(&self) -> Duration {
            match self {
                LockError::Timeout { waited, .. } => *waited,
                other => panic!("expected LockError::Timeout, got {other:?}"),
            }
        }
    }
}
