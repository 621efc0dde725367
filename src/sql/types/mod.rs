use std::{cmp::Ordering, fmt::Display};

use serde::{Deserialize, Serialize};

mod chunk;
mod record;

pub use chunk::{DataChunk, DataColumn, DataRow, DataSchema};
pub use record::{Record, MAX_TEXT_LEN};

/// Supported SQL data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Int,
    Float,
    Bool,
    Text,
}

impl Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DataType::Int => "INT",
            DataType::Float => "FLOAT",
            DataType::Bool => "BOOL",
            DataType::Text => "TEXT",
        })
    }
}

/// Runtime value. There is no NULL: an absent value is an unset slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Value {
    /// Returns the data type tag of the value
    pub fn datatype(&self) -> DataType {
        match self {
            Self::Int(_) => DataType::Int,
            Self::Float(_) => DataType::Float,
            Self::Bool(_) => DataType::Bool,
            Self::Text(_) => DataType::Text,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(true) => write!(f, "TRUE"),
            Value::Bool(false) => write!(f, "FALSE"),
            Value::Text(v) => write!(f, "{}", v),
        }
    }
}

/// Partial ordering used by ORDER BY and comparison operators.
/// INT and FLOAT compare numerically; other mixed pairs are incomparable.
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.partial_cmp(b),
            (_, _) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DataType, Value};

    #[test]
    fn test_value_datatype_and_display() {
        assert_eq!(Value::Int(1).datatype(), DataType::Int);
        assert_eq!(Value::Text("a".into()).datatype(), DataType::Text);
        assert_eq!(Value::Bool(true).to_string(), "TRUE");
        assert_eq!(DataType::Float.to_string(), "FLOAT");
    }

    #[test]
    fn test_value_ordering() {
        assert!(Value::Int(1) < Value::Float(1.5));
        assert!(Value::Text("b".into()) > Value::Text("a".into()));
        assert_eq!(Value::Int(1).partial_cmp(&Value::Text("1".into())), None);
    }
}
