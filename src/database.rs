use std::sync::Arc;

use crate::buffer::buffer_pool::BufferPool;
use crate::catalog::Catalog;

/// Owns the catalog and the buffer pool and wires them together. One
/// `Database` corresponds to one set of heap files; transactions are
/// just ids handed to the buffer pool.
pub struct Database {
    catalog: Arc<Catalog>,
    buffer_pool: Arc<BufferPool>,
}

impl Database {
    pub fn new() -> Self {
        let catalog = Arc::new(Catalog::new());
        let buffer_pool = Arc::new(BufferPool::with_default_capacity(catalog.clone()));
        Self {
            catalog,
            buffer_pool,
        }
    }

    pub fn with_pool_capacity(capacity: usize) -> Self {
        let catalog = Arc::new(Catalog::new());
        let buffer_pool = Arc::new(BufferPool::new(catalog.clone(), capacity));
        Self {
            catalog,
            buffer_pool,
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn buffer_pool(&self) -> &BufferPool {
        &self.buffer_pool
    }

    /// Replaces the buffer pool with a fresh, empty one over the same
    /// catalog, dropping every cached page. Tests use this to prove that
    /// committed data survives on disk.
    pub fn reset_buffer_pool(&mut self, capacity: usize) {
        self.buffer_pool = Arc::new(BufferPool::new(self.catalog.clone(), capacity));
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use super::Database;
    use crate::catalog::schema::{ColumnDefinition, Schema, TypeId};
    use crate::common::DEFAULT_PAGES;
    use crate::concurrency::TransactionId;
    use crate::storage::heap::file::HeapFile;
    use crate::tuple::value::Value;
    use crate::tuple::Tuple;

    fn int_schema() -> Schema {
        Schema::new(vec![ColumnDefinition::new(TypeId::Integer, "number")])
    }

    #[test]
    fn the_default_pool_capacity_applies() {
        let db = Database::new();
        assert_eq!(db.buffer_pool().capacity(), DEFAULT_PAGES);
    }

    #[test]
    fn committed_tuples_survive_a_pool_restart() -> Result<()> {
        let data_dir = tempdir()?;
        let mut db = Database::with_pool_capacity(16);
        let file = HeapFile::open(data_dir.path().join("numbers"), int_schema())?;
        let table_id = db.catalog().add_table(file, "numbers");

        let tid = TransactionId::new();
        for i in 0..504 {
            let mut tuple = Tuple::new(vec![Value::Integer(i)]);
            db.buffer_pool().insert_tuple(tid, table_id, &mut tuple)?;
        }
        db.buffer_pool().transaction_complete(tid, true)?;

        db.reset_buffer_pool(16);

        let tid = TransactionId::new();
        let file = db.catalog().get_table(table_id)?;
        let numbers: Vec<i32> = file
            .iter(tid, db.buffer_pool())
            .map(|tuple| tuple.map(|t| t.as_i32(0)))
            .collect::<Result<_, _>>()?;
        assert_eq!(numbers, (0..504).collect::<Vec<i32>>());
        Ok(())
    }

    #[test]
    fn scans_cross_page_boundaries() -> Result<()> {
        let data_dir = tempdir()?;
        let mut db = Database::with_pool_capacity(16);
        let schema = Schema::new(vec![
            ColumnDefinition::new(TypeId::Integer, "id"),
            ColumnDefinition::new(TypeId::Text, "name"),
        ]);
        let file = HeapFile::open(data_dir.path().join("people"), schema)?;
        let table_id = db.catalog().add_table(file, "people");

        // 30 tuples per page, so this spans several pages
        let tid = TransactionId::new();
        for i in 0..100 {
            let mut tuple = Tuple::new(vec![
                Value::Integer(i),
                Value::String(format!("person {}", i)),
            ]);
            db.buffer_pool().insert_tuple(tid, table_id, &mut tuple)?;
        }
        db.buffer_pool().transaction_complete(tid, true)?;

        let file = db.catalog().get_table(table_id)?;
        assert_eq!(file.num_pages()?, 4);

        db.reset_buffer_pool(16);
        let tid = TransactionId::new();
        let file = db.catalog().get_table(table_id)?;
        assert_eq!(file.iter(tid, db.buffer_pool()).count(), 100);
        Ok(())
    }

    #[test]
    fn concurrent_readers_share_the_pool() -> Result<()> {
        let data_dir = tempdir()?;
        let db = Database::with_pool_capacity(16);
        let file = HeapFile::open(data_dir.path().join("numbers"), int_schema())?;
        let table_id = db.catalog().add_table(file, "numbers");

        let tid = TransactionId::new();
        for i in 0..100 {
            let mut tuple = Tuple::new(vec![Value::Integer(i)]);
            db.buffer_pool().insert_tuple(tid, table_id, &mut tuple)?;
        }
        db.buffer_pool().transaction_complete(tid, true)?;

        std::thread::scope(|scope| {
            let db = &db;
            for _ in 0..4 {
                scope.spawn(move || {
                    let tid = TransactionId::new();
                    let file = db.catalog().get_table(table_id).unwrap();
                    let count = file.iter(tid, db.buffer_pool()).count();
                    assert_eq!(count, 100);
                    db.buffer_pool().transaction_complete(tid, true).unwrap();
                });
            }
        });
        Ok(())
    }

    #[test]
    fn commits_are_visible_and_aborts_are_not() -> Result<()> {
        let data_dir = tempdir()?;
        let db = Database::with_pool_capacity(16);
        let file = HeapFile::open(data_dir.path().join("numbers"), int_schema())?;
        let table_id = db.catalog().add_table(file, "numbers");

        let t1 = TransactionId::new();
        let mut tuple = Tuple::new(vec![Value::Integer(42)]);
        db.buffer_pool().insert_tuple(t1, table_id, &mut tuple)?;
        db.buffer_pool().transaction_complete(t1, true)?;

        let file = db.catalog().get_table(table_id)?;
        let file_len = std::fs::metadata(file.path())?.len();

        let t2 = TransactionId::new();
        let numbers: Vec<i32> = file
            .iter(t2, db.buffer_pool())
            .map(|tuple| tuple.map(|t| t.as_i32(0)))
            .collect::<Result<_, _>>()?;
        assert_eq!(numbers, vec![42]);
        db.buffer_pool().transaction_complete(t2, true)?;

        let t3 = TransactionId::new();
        let mut tuple = Tuple::new(vec![Value::Integer(99)]);
        db.buffer_pool().insert_tuple(t3, table_id, &mut tuple)?;
        db.buffer_pool().transaction_complete(t3, false)?;

        let t4 = TransactionId::new();
        let numbers: Vec<i32> = file
            .iter(t4, db.buffer_pool())
            .map(|tuple| tuple.map(|t| t.as_i32(0)))
            .collect::<Result<_, _>>()?;
        assert_eq!(numbers, vec![42]);
        db.buffer_pool().transaction_complete(t4, true)?;

        // the aborted insert fit on the committed page, so the file did
        // not grow
        assert_eq!(std::fs::metadata(file.path())?.len(), file_len);
        Ok(())
    }
}
