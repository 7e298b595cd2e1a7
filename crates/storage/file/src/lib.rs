//! The `file` crate is responsible for the interaction between the engine and the per-table page stores.
//! Its main logic centers around retrieving from/writing to disk data pages, and applying the heap
//! row format to pages handed to it by the coordinator.

pub mod api;

pub mod catalog;

/// The disk based heap file
pub mod heap_file;

/// A heap file held entirely in memory
pub mod memory_heap_file;

pub mod storage_error;
