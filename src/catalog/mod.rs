use std::sync::Arc;

use dashmap::DashMap;

use crate::common::TableId;
use crate::error::{DbError, DbResult};
use crate::storage::heap::file::HeapFile;

pub mod schema;

/// Maps table names to table ids and table ids to their heap files. The
/// buffer pool resolves page ids against it when loading and flushing
/// pages.
pub struct Catalog {
    table_id_to_file: DashMap<TableId, Arc<HeapFile>>,
    table_name_to_id: DashMap<String, TableId>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            table_id_to_file: DashMap::new(),
            table_name_to_id: DashMap::new(),
        }
    }

    /// Registers a heap file under a name. A table registered twice
    /// under the same name shadows the earlier entry, like the original
    /// engine's catalog.
    pub fn add_table(&self, file: HeapFile, name: &str) -> TableId {
        let table_id = file.id();
        self.table_id_to_file.insert(table_id, Arc::new(file));
        self.table_name_to_id.insert(name.to_owned(), table_id);
        table_id
    }

    pub fn get_table(&self, table_id: TableId) -> DbResult<Arc<HeapFile>> {
        self.table_id_to_file
            .get(&table_id)
            .map(|entry| entry.value().clone())
            .ok_or(DbError::TableNotFound(table_id))
    }

    pub fn get_table_id(&self, name: &str) -> Option<TableId> {
        self.table_name_to_id.get(name).map(|entry| *entry.value())
    }

    pub fn get_table_name(&self, table_id: TableId) -> DbResult<String> {
        self.table_name_to_id
            .iter()
            .find(|entry| *entry.value() == table_id)
            .map(|entry| entry.key().clone())
            .ok_or(DbError::TableNotFound(table_id))
    }

    /// The ids of every registered table.
    pub fn table_ids(&self) -> Vec<TableId> {
        self.table_id_to_file
            .iter()
            .map(|entry| *entry.key())
            .collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
