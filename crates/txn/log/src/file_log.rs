use crate::TransactionLog;
use crate::errors::{LogError, LogResult};
use crate::record::{LogKind, LogRecord, RECORD_SIZE};
use page::transaction_id::TransactionId;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Append-only log file of fixed-size [`LogRecord`]s.
///
/// Records are buffered; commit and abort records flush the buffer and sync the file before
/// returning, begin records do not.
#[derive(Debug)]
pub struct FileLog {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl FileLog {
    /// Opens (or creates) the log at `path`, creating missing parent directories.
    pub fn open(path: impl AsRef<Path>) -> LogResult<Self> {
        let path = path.as_ref().to_path_buf();
        let io_err = |source| LogError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;

        tracing::debug!(path = %path.display(), "opened transaction log");
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every record of the log at `path`.
    pub fn read_records(path: impl AsRef<Path>) -> LogResult<Vec<LogRecord>> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| LogError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let chunks = bytes.chunks_exact(RECORD_SIZE);
        let trailing = chunks.remainder().len();
        if trailing != 0 {
            return Err(LogError::Truncated {
                path: path.to_path_buf(),
                trailing,
            });
        }
        chunks
            .enumerate()
            .map(|(index, chunk)| LogRecord::decode(chunk, index * RECORD_SIZE))
            .collect()
    }

    fn append(&self, kind: LogKind, tid: TransactionId, sync: bool) -> LogResult<()> {
        let bytes = LogRecord::new(kind, tid).encode()?;
        let io_err = |source| LogError::Io {
            path: self.path.clone(),
            source,
        };

        let mut writer = self
            .writer
            .lock()
            .expect("FileLog poisoned: another thread panicked while appending");
        writer.write_all(&bytes).map_err(io_err)?;
        if sync {
            writer.flush().map_err(io_err)?;
            writer.get_ref().sync_data().map_err(io_err)?;
        }
        tracing::trace!(%tid, %kind, sync, "log record appended");
        Ok(())
    }
}

impl TransactionLog for FileLog {
    fn log_begin(&self, tid: TransactionId) -> LogResult<()> {
        self.append(LogKind::Begin, tid, false)
    }

    fn log_commit(&self, tid: TransactionId) -> LogResult<()> {
        self.append(LogKind::Commit, tid, true)
    }

    fn log_abort(&self, tid: TransactionId) -> LogResult<()> {
        self.append(LogKind::Abort, tid, true)
    }
}
