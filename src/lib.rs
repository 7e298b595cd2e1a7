//! # pagetx
//!
//! Transactional page cache and page-level two-phase locking core of a disk-backed storage engine.
//!
//! The engine is composed of multiple internal components organized under
//! the `/crates` directory of this workspace:
//!
//! - `/storage`: identifiers and pages, the page store collaborators (`file`), the bounded
//!   page cache (`buffer`) and the transaction coordinator (`storage-api`).
//! - `/txn`: the page lock table with deadlock detection (`lock`) and the transaction log
//!   contract (`txn-log`).

pub use buffer;
pub use file;
pub use lock;
pub use txn_log;
pub use page;
pub use storage_api;
