use lazy_static::lazy_static;

use super::Executor;
use crate::buffer::BufferPool;
use crate::catalog::schema::{ColumnDefinition, Schema, TypeId};
use crate::common::TableId;
use crate::concurrency::TransactionId;
use crate::error::DbResult;
use crate::tuple::value::Value;
use crate::tuple::Tuple;

lazy_static! {
    static ref INSERT_EXECUTOR_SCHEMA: Schema = Schema::new(vec![ColumnDefinition::new(
        TypeId::Integer,
        "inserted"
    )]);
}

/// Inserts every tuple produced by its child into the target table
/// through the buffer pool, then emits a single tuple holding the
/// number of insertions.
pub struct InsertExecutor<'a> {
    pool: &'a BufferPool,
    tid: TransactionId,
    table_id: TableId,
    child: Box<dyn Executor + 'a>,
    done: bool,
}

impl<'a> InsertExecutor<'a> {
    pub fn new(
        pool: &'a BufferPool,
        tid: TransactionId,
        table_id: TableId,
        child: Box<dyn Executor + 'a>,
    ) -> Self {
        Self {
            pool,
            tid,
            table_id,
            child,
            done: false,
        }
    }

    fn next(&mut self) -> DbResult<Option<Tuple>> {
        if self.done {
            return Ok(None);
        }
        self.done = true;

        let mut inserted = 0;
        while let Some(mut tuple) = self.child.next().transpose()? {
            self.pool.insert_tuple(self.tid, self.table_id, &mut tuple)?;
            inserted += 1;
        }
        Ok(Some(Tuple::new(vec![Value::Integer(inserted)])))
    }
}

impl<'a> Executor for InsertExecutor<'a> {
    fn schema(&self) -> &Schema {
        &INSERT_EXECUTOR_SCHEMA
    }

    fn next(&mut self) -> Option<DbResult<Tuple>> {
        self.next().transpose()
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.done = false;
        self.child.rewind()
    }
}
