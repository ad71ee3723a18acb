use super::Executor;
use crate::buffer::BufferPool;
use crate::catalog::schema::Schema;
use crate::concurrency::TransactionId;
use crate::error::DbResult;
use crate::storage::heap::file::{HeapFile, HeapFileIterator};
use crate::tuple::Tuple;

pub struct SeqScanExecutor<'a> {
    file: &'a HeapFile,
    iter: HeapFileIterator<'a>,
}

impl<'a> SeqScanExecutor<'a> {
    pub fn new(file: &'a HeapFile, pool: &'a BufferPool, tid: TransactionId) -> Self {
        Self {
            file,
            iter: file.iter(tid, pool),
        }
    }
}

impl<'a> Executor for SeqScanExecutor<'a> {
    fn schema(&self) -> &Schema {
        self.file.schema()
    }

    fn next(&mut self) -> Option<DbResult<Tuple>> {
        self.iter.next()
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.iter.rewind();
        Ok(())
    }
}
