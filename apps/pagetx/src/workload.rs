//! Concurrent demo workload: every worker thread runs small insert transactions against one table
//! and retries the ones aborted by a deadlock or a lock timeout.

use crate::config::WorkloadConfig;
use page::page_id::TableId;
use std::sync::atomic::{AtomicUsize, Ordering};
use storage_api::errors::DbResult;
use storage_api::storage_manager::{Permission, StorageManager};
use storage_api::transaction::Transaction;

#[derive(Debug, Default)]
pub struct WorkloadSummary {
    pub committed: AtomicUsize,
    pub aborted: AtomicUsize,
    pub retries: AtomicUsize,
    /// Transactions that exhausted their retries or failed for another reason.
    pub failed: AtomicUsize,
    pub rows_inserted: AtomicUsize,
}

pub fn run(manager: &StorageManager, table_id: TableId, config: &WorkloadConfig) -> WorkloadSummary {
    let summary = WorkloadSummary::default();

    std::thread::scope(|s| {
        for worker in 0..config.workers {
            let summary = &summary;
            s.spawn(move || {
                for n in 0..config.transactions_per_worker {
                    run_with_retries(manager, table_id, config, worker, n, summary);
                }
                tracing::debug!(worker, "worker finished");
            });
        }
    });

    summary
}

fn run_with_retries(
    manager: &StorageManager,
    table_id: TableId,
    config: &WorkloadConfig,
    worker: usize,
    n: usize,
    summary: &WorkloadSummary,
) {
    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            summary.retries.fetch_add(1, Ordering::Relaxed);
        }

        let mut tx = Transaction::new();
        match attempt_transaction(manager, &mut tx, table_id, config, worker, n) {
            Ok(rows) => {
                summary.committed.fetch_add(1, Ordering::Relaxed);
                summary.rows_inserted.fetch_add(rows, Ordering::Relaxed);
                return;
            }
            Err(e) => {
                if let Err(abort_error) = tx.abort(manager) {
                    tracing::warn!(tid = %tx.id(), error = %abort_error, "abort failed");
                }
                if !e.is_aborted() {
                    tracing::error!(tid = %tx.id(), worker, error = %e, "transaction failed");
                    summary.failed.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                summary.aborted.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(tid = %tx.id(), worker, attempt, error = %e, "transaction aborted");
            }
        }
    }

    tracing::warn!(worker, n, retries = config.max_retries, "giving up on transaction");
    summary.failed.fetch_add(1, Ordering::Relaxed);
}

/// Inserts the transaction's rows, reads the first one back and commits. Returns the number of
/// rows inserted.
fn attempt_transaction(
    manager: &StorageManager,
    tx: &mut Transaction,
    table_id: TableId,
    config: &WorkloadConfig,
    worker: usize,
    n: usize,
) -> DbResult<usize> {
    tx.begin(manager)?;
    let tid = tx.id();
    let mut first = None;
    for r in 0..config.rows_per_transaction {
        let row = format!("worker-{worker}-tx-{n}-row-{r}");
        let record_id = manager.insert_tuple(tid, table_id, row.as_bytes())?;
        first.get_or_insert((record_id, row));
    }

    if let Some((record_id, row)) = first {
        let page = manager.get_page(tid, record_id.page_id, Permission::ReadOnly)?;
        let guard = page.read();
        match guard.row(record_id.slot) {
            Ok(Some(stored)) if stored == row.as_bytes() => {}
            other => tracing::error!(%tid, %record_id, ?other, "row read back does not match"),
        }
    }

    tx.commit(manager)?;
    Ok(config.rows_per_transaction)
}
