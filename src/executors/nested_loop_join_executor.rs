use super::{Executor, JoinPredicate};
use crate::catalog::schema::Schema;
use crate::error::DbResult;
use crate::tuple::Tuple;

/// Inner join of two children by nested iteration: for every left tuple
/// the right child is drained and rewound. Matching pairs are emitted as
/// the concatenation of both tuples, so an equality predicate leaves two
/// copies of the join column in the output.
pub struct NestedLoopJoinExecutor<'a> {
    left_child: Box<dyn Executor + 'a>,
    right_child: Box<dyn Executor + 'a>,
    predicate: JoinPredicate,
    left_tuple: Option<Tuple>,
    schema: Schema,
}

impl<'a> NestedLoopJoinExecutor<'a> {
    pub fn new(
        left_child: Box<dyn Executor + 'a>,
        right_child: Box<dyn Executor + 'a>,
        predicate: JoinPredicate,
    ) -> Self {
        let schema = Schema::merge(left_child.schema(), right_child.schema());
        Self {
            left_child,
            right_child,
            predicate,
            left_tuple: None,
            schema,
        }
    }

    fn next(&mut self) -> DbResult<Option<Tuple>> {
        if self.left_tuple.is_none() {
            self.left_tuple = self.left_child.next().transpose()?;
            self.right_child.rewind()?;
        }
        while let Some(ref left_tuple) = self.left_tuple {
            while let Some(right_tuple) = self.right_child.next().transpose()? {
                if self.predicate.evaluate(left_tuple, &right_tuple) {
                    let mut values = left_tuple.values().to_vec();
                    values.extend(right_tuple.values().iter().cloned());
                    return Ok(Some(Tuple::new(values)));
                }
            }
            self.left_tuple = self.left_child.next().transpose()?;
            self.right_child.rewind()?;
        }
        Ok(None)
    }
}

impl<'a> Executor for NestedLoopJoinExecutor<'a> {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn next(&mut self) -> Option<DbResult<Tuple>> {
        self.next().transpose()
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.left_tuple = None;
        self.left_child.rewind()?;
        self.right_child.rewind()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::schema::{ColumnDefinition, Schema, TypeId};
    use crate::executors::values_executor::ValuesExecutor;
    use crate::executors::{Executor, JoinPredicate, Op};
    use crate::tuple::value::Value;
    use crate::tuple::Tuple;

    use super::NestedLoopJoinExecutor;

    fn numbers_source() -> ValuesExecutor {
        let schema = Schema::new(vec![
            ColumnDefinition::new(TypeId::Integer, "id"),
            ColumnDefinition::new(TypeId::Integer, "number"),
        ]);
        let rows = (1..=4).map(|i| vec![Value::Integer(i), Value::Integer(10 * i)]).collect();
        ValuesExecutor::new(rows, schema)
    }

    fn strings_source() -> ValuesExecutor {
        let schema = Schema::new(vec![
            ColumnDefinition::new(TypeId::Integer, "id"),
            ColumnDefinition::new(TypeId::Text, "string"),
        ]);
        let rows = vec![
            vec![Value::Integer(1), Value::String("foo".to_owned())],
            vec![Value::Integer(2), Value::String("bar".to_owned())],
            vec![Value::Integer(3), Value::String("baz".to_owned())],
        ];
        ValuesExecutor::new(rows, schema)
    }

    fn drain(executor: &mut dyn Executor) -> Vec<Tuple> {
        let mut tuples = Vec::new();
        while let Some(tuple) = executor.next().transpose().unwrap() {
            tuples.push(tuple);
        }
        tuples
    }

    #[test]
    fn joins_matching_rows() {
        let predicate = JoinPredicate::new(0, Op::Equals, 0);
        let mut join = NestedLoopJoinExecutor::new(
            Box::new(numbers_source()),
            Box::new(strings_source()),
            predicate,
        );

        let result = drain(&mut join);
        let expected = vec![
            Tuple::new(vec![
                Value::Integer(1),
                Value::Integer(10),
                Value::Integer(1),
                Value::String("foo".to_owned()),
            ]),
            Tuple::new(vec![
                Value::Integer(2),
                Value::Integer(20),
                Value::Integer(2),
                Value::String("bar".to_owned()),
            ]),
            Tuple::new(vec![
                Value::Integer(3),
                Value::Integer(30),
                Value::Integer(3),
                Value::String("baz".to_owned()),
            ]),
        ];
        assert_eq!(result, expected);
        assert_eq!(join.schema().columns().len(), 4);
    }

    #[test]
    fn inequality_predicates_produce_cross_products() {
        let predicate = JoinPredicate::new(0, Op::LessThan, 0);
        let mut join = NestedLoopJoinExecutor::new(
            Box::new(numbers_source()),
            Box::new(strings_source()),
            predicate,
        );

        // pairs where left.id < right.id: (1,2), (1,3), (2,3)
        assert_eq!(drain(&mut join).len(), 3);

        join.rewind().unwrap();
        assert_eq!(drain(&mut join).len(), 3);
    }
}
