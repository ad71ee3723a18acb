use std::fmt::Display;

use crate::catalog::schema::{TypeId, TEXT_CAPACITY};
use crate::executors::Op;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    Integer(i32),
    String(String),
}

fn compare<T: PartialEq + PartialOrd + ?Sized>(left: &T, right: &T, op: Op) -> bool {
    match op {
        Op::Equals => left == right,
        Op::NotEquals => left != right,
        Op::LessThan => left < right,
        Op::LessThanOrEq => left <= right,
        Op::GreaterThan => left > right,
        Op::GreaterThanOrEq => left >= right,
    }
}

impl Value {
    pub fn type_id(&self) -> TypeId {
        match self {
            Value::Integer(_) => TypeId::Integer,
            Value::String(_) => TypeId::Text,
        }
    }

    /// Parses a value from its fixed-width on-page image.
    pub fn parse_value(bytes: &[u8], type_id: TypeId) -> Self {
        match type_id {
            TypeId::Integer => {
                let val = i32::from_be_bytes(bytes[..4].try_into().unwrap());
                Value::Integer(val)
            }
            TypeId::Text => {
                let len = u32::from_be_bytes(bytes[..4].try_into().unwrap()) as usize;
                let len = len.min(TEXT_CAPACITY);
                let val = String::from_utf8_lossy(&bytes[4..4 + len]).into_owned();
                Value::String(val)
            }
        }
    }

    /// Writes the fixed-width image of this value into the buffer. The
    /// buffer must be at least `type_id().field_size()` bytes; text
    /// payloads are zero-padded up to their capacity.
    pub fn serialize_value(&self, buffer: &mut [u8]) {
        match self {
            Value::Integer(val) => {
                buffer[..4].copy_from_slice(val.to_be_bytes().as_slice());
            }
            Value::String(val) => {
                let bytes = val.as_bytes();
                let len = bytes.len().min(TEXT_CAPACITY);
                buffer[..4].copy_from_slice((len as u32).to_be_bytes().as_slice());
                buffer[4..4 + len].copy_from_slice(&bytes[..len]);
                buffer[4 + len..4 + TEXT_CAPACITY].fill(0);
            }
        }
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            Value::Integer(val) => *val,
            _ => unreachable!(),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Value::String(val) => val,
            _ => unreachable!(),
        }
    }

    /// Compares itself against another value of the same type.
    pub fn compare(&self, other: &Value, op: Op) -> bool {
        match (self, other) {
            (Value::Integer(left), Value::Integer(right)) => compare(left, right, op),
            (Value::String(left), Value::String(right)) => {
                compare(left.as_str(), right.as_str(), op)
            }
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(val) => Display::fmt(val, f),
            Value::String(val) => Display::fmt(val, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Value;
    use crate::catalog::schema::TypeId;
    use crate::executors::Op;

    fn serialize_parse_test_helper(buffer: &mut [u8], type_id: TypeId, value: Value) {
        value.serialize_value(buffer);
        let parsed_value = Value::parse_value(buffer, type_id);
        assert_eq!(parsed_value, value);
    }

    #[test]
    fn serialize_parse_test() {
        let mut buffer = [0u8; 4];
        serialize_parse_test_helper(&mut buffer, TypeId::Integer, Value::Integer(42));
        serialize_parse_test_helper(&mut buffer, TypeId::Integer, Value::Integer(-1));

        let mut buffer = [0u8; 132];
        serialize_parse_test_helper(&mut buffer, TypeId::Text, Value::String("pagedb".to_owned()));
        serialize_parse_test_helper(&mut buffer, TypeId::Text, Value::String(String::new()));
    }

    #[test]
    fn integers_are_big_endian() {
        let mut buffer = [0u8; 4];
        Value::Integer(1).serialize_value(&mut buffer);
        assert_eq!(buffer, [0, 0, 0, 1]);
    }

    #[test]
    fn comparisons() {
        let one = Value::Integer(1);
        let two = Value::Integer(2);
        assert!(one.compare(&two, Op::LessThan));
        assert!(one.compare(&one, Op::LessThanOrEq));
        assert!(two.compare(&one, Op::GreaterThan));
        assert!(one.compare(&one, Op::Equals));
        assert!(one.compare(&two, Op::NotEquals));

        let foo = Value::String("foo".to_owned());
        let bar = Value::String("bar".to_owned());
        assert!(bar.compare(&foo, Op::LessThan));
        assert!(!foo.compare(&one, Op::Equals));
    }
}
