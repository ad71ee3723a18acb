use crate::catalog::schema::Schema;
use crate::error::DbResult;
use crate::tuple::value::Value;
use crate::tuple::Tuple;

pub mod aggregate_executor;
pub mod delete_executor;
pub mod filter_executor;
pub mod insert_executor;
pub mod nested_loop_join_executor;
pub mod seq_scan_executor;
pub mod values_executor;

/// A pull-based query operator. Calling `next` repeatedly drains the
/// operator; `rewind` restarts it from the beginning.
pub trait Executor {
    fn schema(&self) -> &Schema;
    fn next(&mut self) -> Option<DbResult<Tuple>>;
    fn rewind(&mut self) -> DbResult<()>;
}

/// Comparison operators usable in predicates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Op {
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEq,
    GreaterThan,
    GreaterThanOrEq,
}

/// Compares one column of a tuple against a constant.
#[derive(Clone, Debug)]
pub struct Predicate {
    column: usize,
    op: Op,
    operand: Value,
}

impl Predicate {
    pub fn new(column: usize, op: Op, operand: Value) -> Self {
        Self {
            column,
            op,
            operand,
        }
    }

    pub fn evaluate(&self, tuple: &Tuple) -> bool {
        tuple.values()[self.column].compare(&self.operand, self.op)
    }
}

/// Compares one column of the left tuple against one column of the
/// right tuple.
#[derive(Clone, Debug)]
pub struct JoinPredicate {
    left_column: usize,
    op: Op,
    right_column: usize,
}

impl JoinPredicate {
    pub fn new(left_column: usize, op: Op, right_column: usize) -> Self {
        Self {
            left_column,
            op,
            right_column,
        }
    }

    pub fn evaluate(&self, left: &Tuple, right: &Tuple) -> bool {
        left.values()[self.left_column].compare(&right.values()[self.right_column], self.op)
    }
}
