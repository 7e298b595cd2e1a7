use thiserror::Error;

/// Checked narrowing of `usize` values into the widths used by on-page fields.
pub trait UsizeConversion {
    fn to_u16(self) -> Result<u16, ConversionError>;
    fn to_u32(self) -> Result<u32, ConversionError>;
}

impl UsizeConversion for usize {
    fn to_u16(self) -> Result<u16, ConversionError> {
        u16::try_from(self).map_err(|_| ConversionError::Overflow {
            value: self,
            target: "u16",
        })
    }

    fn to_u32(self) -> Result<u32, ConversionError> {
        u32::try_from(self).map_err(|_| ConversionError::Overflow {
            value: self,
            target: "u32",
        })
    }
}

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("value {value} exceeds maximum for {target}")]
    Overflow { value: usize, target: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrows_values_in_range() {
        assert_eq!(4096usize.to_u16().unwrap(), 4096);
        assert_eq!(70_000usize.to_u32().unwrap(), 70_000);
    }

    #[test]
    fn rejects_values_out_of_range() {
        let err = 70_000usize.to_u16().unwrap_err();
        assert!(matches!(err, ConversionError::Overflow { value: 70_000, target: "u16" }));
    }
}
