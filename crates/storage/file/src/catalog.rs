//! A catalog mapping table IDs to the storage files backing them

use crate::api::StorageFile;
use crate::storage_error::{StorageError, StorageResult};
use page::page_id::TableId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Debug)]
struct TableEntry {
    name: String,
    file: Arc<dyn StorageFile>,
}

/// Catalog holding the registered tables: their `TableId`, name and backing `StorageFile`.
#[derive(Debug)]
pub struct Catalog {
    tables: RwLock<HashMap<TableId, TableEntry>>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// Creates a new empty `Catalog`
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Registers `file` under `name`. The table id is taken from the file. A table already
    /// registered with the same id or the same name is replaced.
    pub fn add_table(&self, file: Arc<dyn StorageFile>, name: impl Into<String>) {
        let name = name.into();
        let table_id = file.table_id();
        let mut guard = self
            .tables
            .write()
            .expect("Catalog poisoned: another thread panicked while holding the lock");
        guard.retain(|id, entry| *id == table_id || entry.name != name);
        tracing::debug!(table_id, name = %name, "registered table");
        guard.insert(table_id, TableEntry { name, file });
    }

    /// Resolves the storage file backing `table_id`.
    pub fn database_file(&self, table_id: TableId) -> StorageResult<Arc<dyn StorageFile>> {
        self.read_guard()
            .get(&table_id)
            .map(|entry| Arc::clone(&entry.file))
            .ok_or(StorageError::UnknownTable(table_id))
    }

    /// Resolves a table name to its id.
    pub fn table_id(&self, name: &str) -> StorageResult<TableId> {
        self.read_guard()
            .iter()
            .find(|(_, entry)| entry.name == name)
            .map(|(id, _)| *id)
            .ok_or_else(|| StorageError::UnknownTableName(name.to_string()))
    }

    pub fn table_name(&self, table_id: TableId) -> StorageResult<String> {
        self.read_guard()
            .get(&table_id)
            .map(|entry| entry.name.clone())
            .ok_or(StorageError::UnknownTable(table_id))
    }

    /// All registered table ids, in ascending order.
    pub fn table_ids(&self) -> Vec<TableId> {
        let mut ids: Vec<TableId> = self.read_guard().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Drops every registered table.
    pub fn clear(&self) {
        self.tables
            .write()
            .expect("Catalog poisoned: another thread panicked while holding the lock")
            .clear();
    }

    fn read_guard(&self) -> std::sync::RwLockReadGuard<'_, HashMap<TableId, TableEntry>> {
        self.tables
            .read()
            .expect("Catalog poisoned: another thread panicked while holding the lock")
    }
}
