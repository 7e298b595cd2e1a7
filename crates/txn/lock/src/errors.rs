use crate::lock_mode::LockMode;
use page::page_id::PageId;
use page::transaction_id::TransactionId;
use std::time::Duration;

/// Why a lock request was cancelled. Either way the requesting transaction must abort.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LockError {
    /// No grant and no cycle within the timeout.
    #[error("{tid} timed out after {waited:?} waiting for a {mode} lock on page {page_id}")]
    Timeout {
        tid: TransactionId,
        page_id: PageId,
        mode: LockMode,
        waited: Duration,
    },
    /// The request closed a cycle in the wait-for graph. `cycle` starts at the requester.
    #[error(
        "deadlock: {tid} waiting for a {mode} lock on page {page_id} closes the cycle {}",
        render_cycle(.cycle)
    )]
    Deadlock {
        tid: TransactionId,
        page_id: PageId,
        mode: LockMode,
        cycle: Vec<TransactionId>,
    },
}

impl LockError {
    pub fn tid(&self) -> TransactionId {
        match self {
            LockError::Timeout { tid, .. } | LockError::Deadlock { tid, .. } => *tid,
        }
    }

    pub fn is_deadlock(&self) -> bool {
        matches!(self, LockError::Deadlock { .. })
    }
}

fn render_cycle(cycle: &[TransactionId]) -> String {
    let mut rendered: Vec<String> = cycle.iter().map(ToString::to_string).collect();
    if let Some(first) = cycle.first() {
        rendered.push(first.to_string());
    }
    rendered.join(" -> ")
}
