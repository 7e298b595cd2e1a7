//! The transaction coordinator: the only entry point the rest of the engine uses to reach pages.
//!
//! Every page access goes through the lock table first and the page cache second. Commit flushes
//! the transaction's dirty pages and logs the outcome, abort discards them, and both release every
//! lock the transaction holds.

pub mod errors;
pub mod page_handle;
pub mod storage_manager;
pub mod transaction;

#[cfg(test)]
mod tests;
