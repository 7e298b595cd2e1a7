//! Bounded, no-steal page cache for the storage system.

pub mod buffer;
pub mod errors;
mod frame;

/// Exposes the shared page handle and the `guard`-like structs that provide access to the cached
/// `Page` instances via `&Page` / `&mut Page`
pub mod guards;
