use std::fmt::Display;

use crate::tuple::Tuple;

/// Number of payload bytes reserved for a text field on disk. Shorter
/// strings are zero-padded up to this capacity.
pub const TEXT_CAPACITY: usize = 128;

const INTEGER_SIZE: usize = std::mem::size_of::<i32>();
const TEXT_LENGTH_SIZE: usize = std::mem::size_of::<u32>();

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TypeId {
    Integer,
    Text,
}

impl TypeId {
    /// Returns how many bytes a field of this type occupies on a page.
    /// Every field is fixed-width: integers are stored as 4 big-endian
    /// bytes, texts as a 4-byte big-endian length followed by
    /// TEXT_CAPACITY payload bytes.
    pub fn field_size(&self) -> usize {
        match self {
            TypeId::Integer => INTEGER_SIZE,
            TypeId::Text => TEXT_LENGTH_SIZE + TEXT_CAPACITY,
        }
    }
}

impl Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnDefinition {
    type_id: TypeId,
    column_name: Option<String>,
}

impl ColumnDefinition {
    pub fn new(type_id: TypeId, column_name: impl Into<String>) -> Self {
        Self {
            type_id,
            column_name: Some(column_name.into()),
        }
    }

    /// Creates an unnamed column, e.g. for intermediate operator output.
    pub fn unnamed(type_id: TypeId) -> Self {
        Self {
            type_id,
            column_name: None,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn column_name(&self) -> Option<&str> {
        self.column_name.as_deref()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Schema {
    columns: Vec<ColumnDefinition>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnDefinition>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|col| col.column_name() == Some(name))
    }

    /// Returns how many bytes a tuple of this schema occupies on a page.
    pub fn tuple_size(&self) -> usize {
        self.columns
            .iter()
            .map(|col| col.type_id().field_size())
            .sum()
    }

    /// Checks that a tuple's field types line up with this schema.
    pub fn matches(&self, tuple: &Tuple) -> bool {
        tuple.values().len() == self.columns.len()
            && tuple
                .values()
                .iter()
                .zip(self.columns.iter())
                .all(|(value, col)| value.type_id() == col.type_id())
    }

    /// Concatenates two schemas, e.g. for the output of a join.
    pub fn merge(left: &Schema, right: &Schema) -> Schema {
        let mut columns = left.columns.clone();
        columns.extend(right.columns.iter().cloned());
        Schema::new(columns)
    }
}
