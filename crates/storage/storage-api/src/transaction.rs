use crate::errors::{DbError, DbResult};
use crate::storage_manager::StorageManager;
use page::transaction_id::TransactionId;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    NotStarted,
    Active,
    Completed,
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionState::NotStarted => "not started",
            TransactionState::Active => "active",
            TransactionState::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// One logical transaction: `NotStarted -> Active -> Completed`.
///
/// Completing an already completed transaction is a no-op, so error paths may abort
/// unconditionally.
#[derive(Debug)]
pub struct Transaction {
    id: TransactionId,
    state: TransactionState,
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Transaction {
    /// A transaction with a fresh id that has not started yet.
    pub fn new() -> Self {
        Self {
            id: TransactionId::new(),
            state: TransactionState::NotStarted,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Writes the begin record and makes the transaction active.
    pub fn begin(&mut self, manager: &StorageManager) -> DbResult<()> {
        if self.state != TransactionState::NotStarted {
            return Err(self.misuse("begin"));
        }
        manager.begin_transaction(self.id)?;
        self.state = TransactionState::Active;
        Ok(())
    }

    pub fn commit(&mut self, manager: &StorageManager) -> DbResult<()> {
        self.complete(manager, true)
    }

    pub fn abort(&mut self, manager: &StorageManager) -> DbResult<()> {
        self.complete(manager, false)
    }

    fn complete(&mut self, manager: &StorageManager, commit: bool) -> DbResult<()> {
        match self.state {
            TransactionState::Active => {
                // Completed even if the coordinator reports a failure: its cleanup already ran.
                self.state = TransactionState::Completed;
                manager.transaction_complete_with(self.id, commit)
            }
            TransactionState::Completed => {
                tracing::debug!(tid = %self.id, commit, "transaction already completed");
                Ok(())
            }
            TransactionState::NotStarted => {
                Err(self.misuse(if commit { "commit" } else { "abort" }))
            }
        }
    }

    fn misuse(&self, operation: &'static str) -> DbError {
        DbError::ProtocolMisuse {
            tid: self.id,
            operation,
            state: self.state,
        }
    }
}
