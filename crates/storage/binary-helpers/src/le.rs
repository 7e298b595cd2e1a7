use crate::bin_error::BinaryError;

/// An integer that can be stored in little-endian order inside a byte buffer.
pub trait LittleEndianInteger: Sized + Copy {
    const SIZE: usize;

    /// Converts `bytes` to the target integer type. `bytes` must be exactly `Self::SIZE` long.
    fn from_le(bytes: &[u8]) -> Result<Self, BinaryError>;

    /// Writes `self` into `target`, which must be exactly `Self::SIZE` long.
    fn to_le(self, target: &mut [u8]) -> Result<(), BinaryError>;
}

macro_rules! impl_little_endian_integer {
    ($($t:ty),*) => {
        $(
            impl LittleEndianInteger for $t {
                const SIZE: usize = std::mem::size_of::<$t>();

                fn from_le(bytes: &[u8]) -> Result<Self, BinaryError> {
                    Ok(<$t>::from_le_bytes(bytes.try_into()?))
                }

                fn to_le(self, target: &mut [u8]) -> Result<(), BinaryError> {
                    let self_bytes = self.to_le_bytes();
                    if self_bytes.len() != target.len() {
                        return Err(BinaryError::WriteSizeMismatch {
                            src: self_bytes.len(),
                            target: target.len(),
                        });
                    }
                    target.copy_from_slice(&self_bytes);
                    Ok(())
                }
            }
        )*
    };
}

impl_little_endian_integer!(u16, u32, u64);

/// Reads a little-endian integer from `bytes`, starting at `start_offset`.
pub fn read_le<T: LittleEndianInteger>(bytes: &[u8], start_offset: usize) -> Result<T, BinaryError> {
    let slice = range(bytes, start_offset, T::SIZE)?;
    T::from_le(slice)
}

/// Converts `value` to little-endian bytes and writes them at `start_offset` in `bytes`.
pub fn write_le<T: LittleEndianInteger>(
    bytes: &mut [u8],
    start_offset: usize,
    value: T,
) -> Result<(), BinaryError> {
    let slice = range_mut(bytes, start_offset, T::SIZE)?;
    value.to_le(slice)
}

/// Borrows `len` bytes of `bytes` starting at `start_offset`.
pub fn range(bytes: &[u8], start_offset: usize, len: usize) -> Result<&[u8], BinaryError> {
    start_offset
        .checked_add(len)
        .and_then(|end| bytes.get(start_offset..end))
        .ok_or(BinaryError::RangeOutOfBounds {
            offset: start_offset,
            len,
            buffer_len: bytes.len(),
        })
}

/// Mutably borrows `len` bytes of `bytes` starting at `start_offset`.
pub fn range_mut(
    bytes: &mut [u8],
    start_offset: usize,
    len: usize,
) -> Result<&mut [u8], BinaryError> {
    let buffer_len = bytes.len();
    start_offset
        .checked_add(len)
        .and_then(|end| bytes.get_mut(start_offset..end))
        .ok_or(BinaryError::RangeOutOfBounds {
            offset: start_offset,
            len,
            buffer_len,
        })
}
