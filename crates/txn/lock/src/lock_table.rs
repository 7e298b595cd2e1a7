use crate::errors::LockError;
use crate::lock_mode::LockMode;
use crate::wait_for::find_cycle;
use page::page_id::PageId;
use page::transaction_id::TransactionId;
use std::collections::{HashMap, HashSet};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// A request that could not be granted yet. The wait-for edges of the waiting transaction are
/// derived from it against the current holders, so they never go stale when locks are released.
#[derive(Debug, Clone, Copy)]
struct PendingRequest {
    page_id: PageId,
    mode: LockMode,
}

/// How a successful acquisition changed the lock records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grant {
    New,
    Upgraded,
    AlreadyHeld,
}

/// Everything guarded by the table mutex.
///
/// `by_page` and `by_tx` are two indexes over the same set of lock records and are always updated
/// together.
#[derive(Debug, Default)]
struct LockState {
    by_page: HashMap<PageId, HashMap<TransactionId, LockMode>>,
    by_tx: HashMap<TransactionId, HashSet<PageId>>,
    pending: HashMap<TransactionId, PendingRequest>,
}

impl LockState {
    /// Holders of `page_id` whose lock conflicts with `tid` taking it in `mode`.
    /// A transaction never conflicts with itself, which makes Read -> Write an upgrade.
    fn blockers(&self, tid: TransactionId, page_id: PageId, mode: LockMode) -> Vec<TransactionId> {
        self.by_page
            .get(&page_id)
            .into_iter()
            .flatten()
            .filter(|(holder, held)| **holder != tid && !mode.compatible_with(**held))
            .map(|(holder, _)| *holder)
            .collect()
    }

    /// Transactions `tid` is currently waiting for.
    fn waits_for(&self, tid: TransactionId) -> Vec<TransactionId> {
        self.pending
            .get(&tid)
            .map(|request| self.blockers(tid, request.page_id, request.mode))
            .unwrap_or_default()
    }

    fn grant(&mut self, tid: TransactionId, page_id: PageId, mode: LockMode) -> Grant {
        self.by_tx.entry(tid).or_default().insert(page_id);
        let holders = self.by_page.entry(page_id).or_default();
        match holders.get(&tid).copied() {
            None => {
                holders.insert(tid, mode);
                Grant::New
            }
            Some(held) if held >= mode => Grant::AlreadyHeld,
            Some(_) => {
                holders.insert(tid, mode);
                Grant::Upgraded
            }
        }
    }

    fn remove(&mut self, tid: TransactionId, page_id: PageId) -> bool {
        let Some(holders) = self.by_page.get_mut(&page_id) else {
            return false;
        };
        if holders.remove(&tid).is_none() {
            return false;
        }
        if holders.is_empty() {
            self.by_page.remove(&page_id);
        }
        if let Some(pages) = self.by_tx.get_mut(&tid) {
            pages.remove(&page_id);
            if pages.is_empty() {
                self.by_tx.remove(&tid);
            }
        }
        true
    }
}

/// Page lock table implementing strict two-phase locking at page granularity.
///
/// Any number of transactions may share a page in `Read` mode; `Write` excludes every other
/// transaction. A blocked request waits on a condition variable that is notified on every release,
/// and wakes up at least every `poll_interval` to re-run deadlock detection, since the wait-for
/// graph also changes when *other* transactions start waiting. A request that closes a cycle
/// aborts (only the requester's pending state is torn down), and so does a request that is still
/// blocked when its timeout elapses.
#[derive(Debug)]
pub struct LockTable {
    state: Mutex<LockState>,
    released: Condvar,
    poll_interval: Duration,
}

impl LockTable {
    /// Creates an empty table. Blocked requests re-check for deadlocks every `poll_interval`.
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            state: Mutex::new(LockState::default()),
            released: Condvar::new(),
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    /// Acquires a `mode` lock on `page_id` for `tid`, blocking for at most `timeout`.
    ///
    /// Holding `Read` and asking for `Write` upgrades the lock in place; asking for a mode that is
    /// already held (or weaker) is granted immediately.
    pub fn acquire(
        &self,
        tid: TransactionId,
        page_id: PageId,
        mode: LockMode,
        timeout: Duration,
    ) -> Result<(), LockError> {
        let started = Instant::now();
        let mut state = self.lock_state();

        loop {
            if state.blockers(tid, page_id, mode).is_empty() {
                state.pending.remove(&tid);
                let grant = state.grant(tid, page_id, mode);
                tracing::trace!(%tid, %page_id, %mode, ?grant, "lock granted");
                return Ok(());
            }

            state.pending.insert(tid, PendingRequest { page_id, mode });

            if let Some(cycle) = find_cycle(tid, |waiter| state.waits_for(waiter)) {
                state.pending.remove(&tid);
                tracing::warn!(%tid, %page_id, %mode, ?cycle, "deadlock detected, aborting requester");
                return Err(LockError::Deadlock {
                    tid,
                    page_id,
                    mode,
                    cycle,
                });
            }

            let waited = started.elapsed();
            if waited >= timeout {
                state.pending.remove(&tid);
                tracing::warn!(%tid, %page_id, %mode, ?waited, "lock request timed out");
                return Err(LockError::Timeout {
                    tid,
                    page_id,
                    mode,
                    waited,
                });
            }

            let slice = (timeout - waited).min(self.poll_interval);
            state = self
                .released
                .wait_timeout(state, slice)
                .expect("LockTable poisoned: another thread panicked while holding the lock")
                .0;
        }
    }

    /// Releases `tid`'s lock on `page_id`. Releasing a lock that is not held is a no-op.
    pub fn release(&self, tid: TransactionId, page_id: PageId) {
        let removed = self.lock_state().remove(tid, page_id);
        if removed {
            tracing::trace!(%tid, %page_id, "lock released");
            self.released.notify_all();
        }
    }

    /// Releases every lock held by `tid` and forgets any request it still had pending.
    /// Returns the number of locks released.
    pub fn release_all(&self, tid: TransactionId) -> usize {
        let released = {
            let mut state = self.lock_state();
            state.pending.remove(&tid);
            let pages = state.by_tx.get(&tid).cloned().unwrap_or_default();
            pages
                .into_iter()
                .filter(|page_id| state.remove(tid, *page_id))
                .count()
        };
        if released > 0 {
            tracing::debug!(%tid, released, "released all locks");
            self.released.notify_all();
        }
        released
    }

    /// Whether `tid` holds any lock on `page_id`.
    pub fn holds(&self, tid: TransactionId, page_id: PageId) -> bool {
        self.lock_mode(tid, page_id).is_some()
    }

    /// The mode `tid` holds on `page_id`, if any.
    pub fn lock_mode(&self, tid: TransactionId, page_id: PageId) -> Option<LockMode> {
        self.lock_state()
            .by_page
            .get(&page_id)
            .and_then(|holders| holders.get(&tid).copied())
    }

    /// All pages currently locked by `tid`.
    pub fn pages_held(&self, tid: TransactionId) -> HashSet<PageId> {
        self.lock_state()
            .by_tx
            .get(&tid)
            .cloned()
            .unwrap_or_default()
    }

    /// Pages on which `tid` holds `Write`, i.e. every page it may have modified.
    pub fn write_locked_pages(&self, tid: TransactionId) -> Vec<PageId> {
        let state = self.lock_state();
        state
            .by_tx
            .get(&tid)
            .into_iter()
            .flatten()
            .filter(|page_id| {
                state
                    .by_page
                    .get(page_id)
                    .and_then(|holders| holders.get(&tid))
                    == Some(&LockMode::Write)
            })
            .copied()
            .collect()
    }

    /// Every holder of `page_id` with its mode.
    pub fn holders(&self, page_id: PageId) -> Vec<(TransactionId, LockMode)> {
        self.lock_state()
            .by_page
            .get(&page_id)
            .map(|holders| holders.iter().map(|(tid, mode)| (*tid, *mode)).collect())
            .unwrap_or_default()
    }

    /// Whether `tid` is currently blocked in [`LockTable::acquire`].
    pub fn is_waiting(&self, tid: TransactionId) -> bool {
        self.lock_state().pending.contains_key(&tid)
    }

    fn lock_state(&self) -> MutexGuard<'_, LockState> {
        self.state
            .lock()
            .expect("LockTable poisoned: another thread panicked while holding the lock")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_WAIT: Duration = Duration::ZERO;

    fn table() -> LockTable {
        LockTable::new(Duration::from_millis(5))
    }

    #[test]
    fn readers_share_a_page() {
        let locks = table();
        let (t1, t2) = (TransactionId::new(), TransactionId::new());
        let page = PageId::new(1, 1);

        locks.acquire(t1, page, LockMode::Read, NO_WAIT).unwrap();
        locks.acquire(t2, page, LockMode::Read, NO_WAIT).unwrap();

        assert!(locks.holds(t1, page));
        assert!(locks.holds(t2, page));
        assert_eq!(locks.holders(page).len(), 2);
    }

    #[test]
    fn writer_excludes_readers_and_writers() {
        let locks = table();
        let (t1, t2) = (TransactionId::new(), TransactionId::new());
        let page = PageId::new(1, 1);
        locks.acquire(t1, page, LockMode::Write, NO_WAIT).unwrap();

        let read = locks.acquire(t2, page, LockMode::Read, NO_WAIT);
        let write = locks.acquire(t2, page, LockMode::Write, NO_WAIT);

        assert!(matches!(read, Err(LockError::Timeout { .. })));
        assert!(matches!(write, Err(LockError::Timeout { .. })));
        assert!(!locks.holds(t2, page));
        assert!(!locks.is_waiting(t2));
    }

    #[test]
    fn reader_blocks_a_writer() {
        let locks = table();
        let (t1, t2) = (TransactionId::new(), TransactionId::new());
        let page = PageId::new(1, 1);
        locks.acquire(t1, page, LockMode::Read, NO_WAIT).unwrap();

        assert!(locks.acquire(t2, page, LockMode::Write, NO_WAIT).is_err());
    }

    #[test]
    fn sole_reader_upgrades_in_place() {
        let locks = table();
        let tid = TransactionId::new();
        let page = PageId::new(1, 1);

        locks.acquire(tid, page, LockMode::Read, NO_WAIT).unwrap();
        locks.acquire(tid, page, LockMode::Write, NO_WAIT).unwrap();

        assert_eq!(locks.lock_mode(tid, page), Some(LockMode::Write));
        assert_eq!(locks.holders(page), vec![(tid, LockMode::Write)]);
    }

    #[test]
    fn upgrade_waits_for_other_readers() {
        let locks = table();
        let (t1, t2) = (TransactionId::new(), TransactionId::new());
        let page = PageId::new(1, 1);
        locks.acquire(t1, page, LockMode::Read, NO_WAIT).unwrap();
        locks.acquire(t2, page, LockMode::Read, NO_WAIT).unwrap();

        assert!(locks.acquire(t1, page, LockMode::Write, NO_WAIT).is_err());
        assert_eq!(locks.lock_mode(t1, page), Some(LockMode::Read));
    }

    #[test]
    fn repeated_and_weaker_requests_are_no_op_grants() {
        let locks = table();
        let tid = TransactionId::new();
        let page = PageId::new(1, 1);
        locks.acquire(tid, page, LockMode::Write, NO_WAIT).unwrap();

        locks.acquire(tid, page, LockMode::Write, NO_WAIT).unwrap();
        locks.acquire(tid, page, LockMode::Read, NO_WAIT).unwrap();

        assert_eq!(locks.lock_mode(tid, page), Some(LockMode::Write));
        assert_eq!(locks.holders(page).len(), 1);
    }

    #[test]
    fn write_locked_pages_skips_read_locks() {
        let locks = table();
        let tid = TransactionId::new();
        locks.acquire(tid, PageId::new(1, 0), LockMode::Read, NO_WAIT).unwrap();
        locks.acquire(tid, PageId::new(1, 1), LockMode::Write, NO_WAIT).unwrap();
        locks.acquire(tid, PageId::new(1, 2), LockMode::Read, NO_WAIT).unwrap();
        locks.acquire(tid, PageId::new(1, 2), LockMode::Write, NO_WAIT).unwrap();

        let mut pages = locks.write_locked_pages(tid);
        pages.sort_by_key(|page_id| page_id.page_number);

        assert_eq!(pages, vec![PageId::new(1, 1), PageId::new(1, 2)]);
        assert!(locks.write_locked_pages(TransactionId::new()).is_empty());
    }

    #[test]
    fn release_is_idempotent() {
        let locks = table();
        let tid = TransactionId::new();
        let page = PageId::new(1, 1);

        locks.release(tid, page);
        locks.acquire(tid, page, LockMode::Read, NO_WAIT).unwrap();
        locks.release(tid, page);
        locks.release(tid, page);

        assert!(!locks.holds(tid, page));
        assert!(locks.pages_held(tid).is_empty());
        assert!(locks.holders(page).is_empty());
    }

    #[test]
    fn release_all_drops_every_lock_of_the_transaction() {
        let locks = table();
        let (t1, t2) = (TransactionId::new(), TransactionId::new());
        let pages = [PageId::new(1, 0), PageId::new(1, 1), PageId::new(2, 0)];
        for page in pages {
            locks.acquire(t1, page, LockMode::Write, NO_WAIT).unwrap();
        }
        locks.acquire(t2, PageId::new(3, 0), LockMode::Read, NO_WAIT).unwrap();

        assert_eq!(locks.pages_held(t1), HashSet::from(pages));
        assert_eq!(locks.release_all(t1), 3);

        assert!(pages.iter().all(|page| !locks.holds(t1, *page)));
        assert!(locks.holds(t2, PageId::new(3, 0)));
        assert_eq!(locks.release_all(t1), 0);
    }
}
