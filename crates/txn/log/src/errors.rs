use binary_helpers::bin_error::BinaryError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("I/O error on log file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("log file {path} ends with a truncated record ({trailing} trailing bytes)")]
    Truncated { path: PathBuf, trailing: usize },
    #[error("unknown log record kind {kind} at offset {offset}")]
    UnknownKind { kind: u16, offset: usize },
    #[error("log record encoding error: {0}")]
    Binary(#[from] BinaryError),
}

pub type LogResult<T> = Result<T, LogError>;
