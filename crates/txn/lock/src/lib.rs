//! Page-granularity two-phase locking with wait-for-graph deadlock detection.

pub mod errors;
pub mod lock_mode;
pub mod lock_table;

/// Cycle search over the wait-for relation.
pub mod wait_for;

#[cfg(test)]
mod tests;
