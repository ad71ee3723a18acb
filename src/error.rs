use std::io;

use thiserror::Error;

use crate::common::{PageId, PageNo, TableId};
use crate::concurrency::TransactionId;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("page {1} of table {0} is beyond the end of the file")]
    InvalidPage(TableId, PageNo),

    #[error("page ({0}, {1}) has no free slot")]
    SlotFull(TableId, PageNo),

    #[error("tuple does not exist on the expected page")]
    TupleNotFound,

    #[error("transaction {0} aborted while waiting for a lock")]
    TransactionAborted(TransactionId),

    #[error("buffer pool is full and every resident page is dirty")]
    NoSpace,

    #[error("tuple does not match the table schema")]
    SchemaMismatch,

    #[error("no table with id {0}")]
    TableNotFound(TableId),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl DbError {
    pub(crate) fn invalid_page(pid: PageId) -> Self {
        Self::InvalidPage(pid.0, pid.1)
    }

    pub(crate) fn slot_full(pid: PageId) -> Self {
        Self::SlotFull(pid.0, pid.1)
    }
}

pub type DbResult<T> = Result<T, DbError>;
