use super::Executor;
use crate::catalog::schema::Schema;
use crate::error::DbResult;
use crate::tuple::value::Value;
use crate::tuple::Tuple;

/// Emits a fixed list of rows. Serves as the row source for inserts and
/// as a leaf in tests.
pub struct ValuesExecutor {
    cursor: usize,
    rows: Vec<Vec<Value>>,
    schema: Schema,
}

impl ValuesExecutor {
    pub fn new(rows: Vec<Vec<Value>>, schema: Schema) -> Self {
        Self {
            cursor: 0,
            rows,
            schema,
        }
    }
}

impl Executor for ValuesExecutor {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn next(&mut self) -> Option<DbResult<Tuple>> {
        if let Some(values) = self.rows.get(self.cursor) {
            self.cursor += 1;
            Some(Ok(Tuple::new(values.clone())))
        } else {
            None
        }
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.cursor = 0;
        Ok(())
    }
}
