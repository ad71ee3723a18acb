use super::{Executor, Predicate};
use crate::catalog::schema::Schema;
use crate::error::DbResult;
use crate::tuple::Tuple;

pub struct FilterExecutor<'a> {
    child: Box<dyn Executor + 'a>,
    predicate: Predicate,
}

impl<'a> FilterExecutor<'a> {
    pub fn new(child: Box<dyn Executor + 'a>, predicate: Predicate) -> Self {
        Self { child, predicate }
    }

    fn next(&mut self) -> DbResult<Option<Tuple>> {
        while let Some(tuple) = self.child.next().transpose()? {
            if self.predicate.evaluate(&tuple) {
                return Ok(Some(tuple));
            }
        }
        Ok(None)
    }
}

impl<'a> Executor for FilterExecutor<'a> {
    fn schema(&self) -> &Schema {
        self.child.schema()
    }

    fn next(&mut self) -> Option<DbResult<Tuple>> {
        self.next().transpose()
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.child.rewind()
    }
}
