use std::collections::HashMap;

use super::Executor;
use crate::catalog::schema::{ColumnDefinition, Schema, TypeId};
use crate::error::{DbError, DbResult};
use crate::tuple::value::Value;
use crate::tuple::Tuple;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AggregateFunction {
    Min,
    Max,
    Sum,
    Avg,
    Count,
}

#[derive(Clone)]
struct Group {
    min: i32,
    max: i32,
    sum: i64,
    count: i64,
}

impl Group {
    fn new(v: i32) -> Self {
        Self {
            min: v,
            max: v,
            sum: v as i64,
            count: 1,
        }
    }

    fn merge(&mut self, v: i32) {
        self.min = self.min.min(v);
        self.max = self.max.max(v);
        self.sum += v as i64;
        self.count += 1;
    }

    /// The average is the sum of all merged values divided by their
    /// count, computed here rather than maintained per merge.
    fn result(&self, function: AggregateFunction) -> i32 {
        match function {
            AggregateFunction::Min => self.min,
            AggregateFunction::Max => self.max,
            AggregateFunction::Sum => self.sum as i32,
            AggregateFunction::Avg => (self.sum / self.count) as i32,
            AggregateFunction::Count => self.count as i32,
        }
    }
}

/// Computes one aggregate over an integer column, optionally grouped by
/// another column.
pub struct IntegerAggregator {
    group_by: Option<usize>,
    field: usize,
    function: AggregateFunction,
    groups: HashMap<Option<Value>, Group>,
}

impl IntegerAggregator {
    pub fn new(group_by: Option<usize>, field: usize, function: AggregateFunction) -> Self {
        Self {
            group_by,
            field,
            function,
            groups: HashMap::new(),
        }
    }

    pub fn merge_tuple(&mut self, tuple: &Tuple) {
        let key = self.group_by.map(|col| tuple.values()[col].clone());
        let v = tuple.as_i32(self.field);
        self.groups
            .entry(key)
            .and_modify(|group| group.merge(v))
            .or_insert_with(|| Group::new(v));
    }

    fn results(&self) -> Vec<Tuple> {
        self.groups
            .iter()
            .map(|(key, group)| {
                let aggregate = Value::Integer(group.result(self.function));
                match key {
                    Some(group_value) => Tuple::new(vec![group_value.clone(), aggregate]),
                    None => Tuple::new(vec![aggregate]),
                }
            })
            .collect()
    }

    fn reset(&mut self) {
        self.groups.clear();
    }
}

/// Counts tuples of a text column, optionally grouped. Counting is the
/// only aggregate defined over texts.
pub struct StringAggregator {
    group_by: Option<usize>,
    counts: HashMap<Option<Value>, i64>,
}

impl StringAggregator {
    pub fn new(group_by: Option<usize>, function: AggregateFunction) -> DbResult<Self> {
        if function != AggregateFunction::Count {
            return Err(DbError::SchemaMismatch);
        }
        Ok(Self {
            group_by,
            counts: HashMap::new(),
        })
    }

    pub fn merge_tuple(&mut self, tuple: &Tuple) {
        let key = self.group_by.map(|col| tuple.values()[col].clone());
        *self.counts.entry(key).or_insert(0) += 1;
    }

    fn results(&self) -> Vec<Tuple> {
        self.counts
            .iter()
            .map(|(key, count)| {
                let aggregate = Value::Integer(*count as i32);
                match key {
                    Some(group_value) => Tuple::new(vec![group_value.clone(), aggregate]),
                    None => Tuple::new(vec![aggregate]),
                }
            })
            .collect()
    }

    fn reset(&mut self) {
        self.counts.clear();
    }
}

enum Aggregator {
    Integer(IntegerAggregator),
    String(StringAggregator),
}

/// Drains its child on the first call to `next`, merging every tuple
/// into the aggregator, then emits one result tuple per group (or a
/// single tuple when there is no grouping).
pub struct AggregateExecutor<'a> {
    child: Box<dyn Executor + 'a>,
    aggregator: Aggregator,
    schema: Schema,
    results: Option<std::vec::IntoIter<Tuple>>,
}

impl<'a> AggregateExecutor<'a> {
    pub fn new(
        child: Box<dyn Executor + 'a>,
        group_by: Option<usize>,
        field: usize,
        function: AggregateFunction,
    ) -> DbResult<Self> {
        let child_columns = child.schema().columns();
        let aggregator = match child_columns[field].type_id() {
            TypeId::Integer => {
                Aggregator::Integer(IntegerAggregator::new(group_by, field, function))
            }
            TypeId::Text => Aggregator::String(StringAggregator::new(group_by, function)?),
        };

        let mut columns = Vec::new();
        if let Some(group_by) = group_by {
            columns.push(ColumnDefinition::new(
                child_columns[group_by].type_id(),
                "group_value",
            ));
        }
        columns.push(ColumnDefinition::new(TypeId::Integer, "aggregate_value"));

        Ok(Self {
            child,
            aggregator,
            schema: Schema::new(columns),
            results: None,
        })
    }

    fn aggregate_child(&mut self) -> DbResult<()> {
        while let Some(tuple) = self.child.next().transpose()? {
            match &mut self.aggregator {
                Aggregator::Integer(aggregator) => aggregator.merge_tuple(&tuple),
                Aggregator::String(aggregator) => aggregator.merge_tuple(&tuple),
            }
        }
        Ok(())
    }

    fn next(&mut self) -> DbResult<Option<Tuple>> {
        if self.results.is_none() {
            self.aggregate_child()?;
            let results = match &self.aggregator {
                Aggregator::Integer(aggregator) => aggregator.results(),
                Aggregator::String(aggregator) => aggregator.results(),
            };
            self.results = Some(results.into_iter());
        }
        Ok(self.results.as_mut().and_then(|results| results.next()))
    }
}

impl<'a> Executor for AggregateExecutor<'a> {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn next(&mut self) -> Option<DbResult<Tuple>> {
        self.next().transpose()
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.results = None;
        match &mut self.aggregator {
            Aggregator::Integer(aggregator) => aggregator.reset(),
            Aggregator::String(aggregator) => aggregator.reset(),
        }
        self.child.rewind()
    }
}
