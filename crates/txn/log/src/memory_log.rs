use crate::TransactionLog;
use crate::errors::LogResult;
use crate::record::{LogKind, LogRecord};
use page::transaction_id::TransactionId;
use std::sync::Mutex;

/// Keeps log records in memory, in the order they were written.
#[derive(Debug, Default)]
pub struct MemoryLog {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of every record written so far.
    pub fn records(&self) -> Vec<LogRecord> {
        self.lock_records().clone()
    }

    /// The kinds recorded for `tid`, oldest first.
    pub fn kinds_for(&self, tid: TransactionId) -> Vec<LogKind> {
        self.lock_records()
            .iter()
            .filter(|record| record.tid == tid)
            .map(|record| record.kind)
            .collect()
    }

    fn append(&self, kind: LogKind, tid: TransactionId) -> LogResult<()> {
        self.lock_records().push(LogRecord::new(kind, tid));
        tracing::trace!(%tid, %kind, "log record");
        Ok(())
    }

    fn lock_records(&self) -> std::sync::MutexGuard<'_, Vec<LogRecord>> {
        self.records
            .lock()
            .expect("MemoryLog poisoned: another thread panicked while appending")
    }
}

impl TransactionLog for MemoryLog {
    fn log_begin(&self, tid: TransactionId) -> LogResult<()> {
        self.append(LogKind::Begin, tid)
    }

    fn log_commit(&self, tid: TransactionId) -> LogResult<()> {
        self.append(LogKind::Commit, tid)
    }

    fn log_abort(&self, tid: TransactionId) -> LogResult<()> {
        self.append(LogKind::Abort, tid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_call_order() {
        let log = MemoryLog::new();
        let (t1, t2) = (TransactionId::from_raw(1), TransactionId::from_raw(2));

        log.log_begin(t1).unwrap();
        log.log_begin(t2).unwrap();
        log.log_abort(t2).unwrap();
        log.log_commit(t1).unwrap();

        assert_eq!(log.records().len(), 4);
        assert_eq!(log.kinds_for(t1), vec![LogKind::Begin, LogKind::Commit]);
        assert_eq!(log.kinds_for(t2), vec![LogKind::Begin, LogKind::Abort]);
    }
}
