use crate::errors::{LogError, LogResult};
use binary_helpers::le::{read_le, write_le};
use page::transaction_id::TransactionId;
use std::fmt;

/// Encoded size of one record: `kind: u16` followed by `tid: u64`, both little-endian.
pub const RECORD_SIZE: usize = 10;

const KIND_OFFSET: usize = 0;
const TID_OFFSET: usize = 2;

#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    Begin = 1,
    Commit = 2,
    Abort = 3,
}

impl TryFrom<u16> for LogKind {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(LogKind::Begin),
            2 => Ok(LogKind::Commit),
            3 => Ok(LogKind::Abort),
            other => Err(other),
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogKind::Begin => "begin",
            LogKind::Commit => "commit",
            LogKind::Abort => "abort",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRecord {
    pub kind: LogKind,
    pub tid: TransactionId,
}

impl LogRecord {
    pub fn new(kind: LogKind, tid: TransactionId) -> Self {
        Self { kind, tid }
    }

    pub fn encode(&self) -> LogResult<[u8; RECORD_SIZE]> {
        let mut bytes = [0u8; RECORD_SIZE];
        write_le(&mut bytes, KIND_OFFSET, self.kind as u16)?;
        write_le(&mut bytes, TID_OFFSET, self.tid.as_u64())?;
        Ok(bytes)
    }

    /// Decodes the record stored at the start of `bytes`. `offset` is only used for error reports.
    pub fn decode(bytes: &[u8], offset: usize) -> LogResult<Self> {
        let kind: u16 = read_le(bytes, KIND_OFFSET)?;
        let kind = LogKind::try_from(kind).map_err(|kind| LogError::UnknownKind { kind, offset })?;
        let tid: u64 = read_le(bytes, TID_OFFSET)?;
        Ok(Self::new(kind, TransactionId::from_raw(tid)))
    }
}
