use std::array::TryFromSliceError;
use thiserror::Error;

/// Failures of the little-endian encoding helpers.
#[derive(Error, Debug)]
pub enum BinaryError {
    /// `len` bytes starting at `offset` do not fit in a buffer of `buffer_len` bytes.
    #[error("range {offset}..{offset}+{len} is outside a buffer of {buffer_len} bytes")]
    RangeOutOfBounds {
        offset: usize,
        len: usize,
        buffer_len: usize,
    },
    #[error("cannot decode an integer from the slice: {0}")]
    SliceConversion(#[from] TryFromSliceError),
    /// The encoded integer and the destination slice have different lengths.
    #[error("cannot write {src} encoded bytes into a {target} byte slice")]
    WriteSizeMismatch { src: usize, target: usize },
}
