use lazy_static::lazy_static;

use super::Executor;
use crate::buffer::BufferPool;
use crate::catalog::schema::{ColumnDefinition, Schema, TypeId};
use crate::concurrency::TransactionId;
use crate::error::DbResult;
use crate::tuple::value::Value;
use crate::tuple::Tuple;

lazy_static! {
    static ref DELETE_EXECUTOR_SCHEMA: Schema = Schema::new(vec![ColumnDefinition::new(
        TypeId::Integer,
        "deleted"
    )]);
}

/// Deletes every tuple produced by its child (which must carry record
/// ids, e.g. a possibly filtered sequential scan), then emits a single
/// tuple holding the number of deletions.
pub struct DeleteExecutor<'a> {
    pool: &'a BufferPool,
    tid: TransactionId,
    child: Box<dyn Executor + 'a>,
    done: bool,
}

impl<'a> DeleteExecutor<'a> {
    pub fn new(pool: &'a BufferPool, tid: TransactionId, child: Box<dyn Executor + 'a>) -> Self {
        Self {
            pool,
            tid,
            child,
            done: false,
        }
    }

    fn next(&mut self) -> DbResult<Option<Tuple>> {
        if self.done {
            return Ok(None);
        }
        self.done = true;

        let mut deleted = 0;
        while let Some(tuple) = self.child.next().transpose()? {
            self.pool.delete_tuple(self.tid, &tuple)?;
            deleted += 1;
        }
        Ok(Some(Tuple::new(vec![Value::Integer(deleted)])))
    }
}

impl<'a> Executor for DeleteExecutor<'a> {
    fn schema(&self) -> &Schema {
        &DELETE_EXECUTOR_SCHEMA
    }

    fn next(&mut self) -> Option<DbResult<Tuple>> {
        self.next().transpose()
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.done = false;
        self.child.rewind()
    }
}
