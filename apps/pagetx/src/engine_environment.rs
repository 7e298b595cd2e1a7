use crate::config::EngineConfig;
use file::catalog::Catalog;
use file::heap_file::HeapFile;
use file::storage_error::StorageError;
use page::page_id::TableId;
use std::path::PathBuf;
use std::sync::Arc;
use storage_api::storage_manager::StorageManager;
use thiserror::Error;
use txn_log::errors::LogError;
use txn_log::file_log::FileLog;

/// Table the demo workload writes to.
pub const DEMO_TABLE_ID: TableId = 1;
pub const DEMO_TABLE_NAME: &str = "demo";

#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("cannot create directory {path}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Log(#[from] LogError),
}

/// Owner of the instances that are needed for the entire lifetime of the process
#[derive(Debug)]
pub struct EngineEnvironment {
    pub catalog: Arc<Catalog>,
    pub log: Arc<FileLog>,
    pub storage: Arc<StorageManager>,
    pub engine_config: EngineConfig,
}

impl EngineEnvironment {
    pub fn new(config: EngineConfig) -> Result<Self, EnvironmentError> {
        let data_dir = &config.storage.data_dir;
        std::fs::create_dir_all(data_dir).map_err(|source| EnvironmentError::CreateDir {
            path: data_dir.clone(),
            source,
        })?;

        let catalog = Arc::new(Catalog::new());
        let table_path = data_dir.join(format!("{DEMO_TABLE_NAME}.tbl"));
        let table = HeapFile::open(DEMO_TABLE_ID, &table_path)?;
        tracing::info!(path = %table_path.display(), "opened demo table");
        catalog.add_table(Arc::new(table), DEMO_TABLE_NAME);

        let log = Arc::new(FileLog::open(config.storage.logs_dir.join("transactions.log"))?);
        let storage = Arc::new(StorageManager::new(
            catalog.clone(),
            log.clone(),
            config.storage_manager_config(),
        ));

        Ok(Self {
            catalog,
            log,
            storage,
            engine_config: config,
        })
    }
}
