//! The transaction log collaborator: the hooks the coordinator calls at begin, commit and abort.

pub mod errors;
pub mod file_log;
pub mod memory_log;
pub mod record;

use crate::errors::LogResult;
use page::transaction_id::TransactionId;
use std::fmt::Debug;

/// Outcome records for transactions.
///
/// The page cache is no-steal and pages reach disk only at commit, so an aborted transaction has
/// nothing on disk to roll back and `log_abort` only records the outcome.
pub trait TransactionLog: Send + Sync + Debug {
    fn log_begin(&self, tid: TransactionId) -> LogResult<()>;

    /// Called after every page dirtied by `tid` has been written.
    fn log_commit(&self, tid: TransactionId) -> LogResult<()>;

    fn log_abort(&self, tid: TransactionId) -> LogResult<()>;
}
