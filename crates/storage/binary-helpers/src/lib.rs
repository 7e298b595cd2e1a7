//! Small helpers for reading and writing fixed-width integers inside page and log byte buffers.

pub mod bin_error;
pub mod conversions;
pub mod le;
