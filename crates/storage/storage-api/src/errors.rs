use crate::transaction::TransactionState;
use buffer::errors::CacheError;
use file::storage_error::StorageError;
use lock::errors::LockError;
use page::page_id::PageId;
use page::transaction_id::TransactionId;
use txn_log::errors::LogError;

/// Errors surfaced by the coordinator.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A lock request deadlocked or timed out. The transaction must be aborted.
    #[error("transaction aborted: {0}")]
    Aborted(#[from] LockError),

    #[error("page cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("log error: {0}")]
    Log(#[from] LogError),

    #[error("page {page_id} was fetched read-only and cannot be written")]
    ReadOnlyPage { page_id: PageId },

    #[error("cannot {operation} {tid}: transaction is {state}")]
    ProtocolMisuse {
        tid: TransactionId,
        operation: &'static str,
        state: TransactionState,
    },
}

impl DbError {
    /// Whether the caller must roll the transaction back.
    pub fn is_aborted(&self) -> bool {
        matches!(self, DbError::Aborted(_))
    }
}

pub type DbResult<T> = Result<T, DbError>;
