//! Semantic type descriptors
//!
//! Every binding, parameter and literal in a predicate carries a
//! [`ValueType`]. Admission is exact: values are never widened or narrowed
//! to fit a descriptor.

use crate::value::Value;
use std::fmt;

/// Semantic type descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Any value, including null
    Any,
    /// Boolean
    Bool,
    /// 64-bit integer
    Int,
    /// 64-bit float
    Float,
    /// UTF-8 string
    String,
    /// Array whose elements all have the given type
    Array(Box<ValueType>),
    /// Object / record
    Object,
    /// The inner type or null
    Nullable(Box<ValueType>),
}

impl ValueType {
    /// Array of `elem`
    #[must_use]
    pub fn array_of(elem: ValueType) -> Self {
        ValueType::Array(Box::new(elem))
    }

    /// `inner` or null
    #[must_use]
    pub fn nullable(inner: ValueType) -> Self {
        ValueType::Nullable(Box::new(inner))
    }

    /// Check whether `value` belongs to this type without any conversion
    #[must_use]
    pub fn admits(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueType::Any, _) => true,
            (ValueType::Nullable(_), Value::Null) => true,
            (ValueType::Nullable(inner), v) => inner.admits(v),
            (ValueType::Bool, Value::Bool(_))
            | (ValueType::Int, Value::Int(_))
            | (ValueType::Float, Value::Float(_))
            | (ValueType::String, Value::String(_))
            | (ValueType::Object, Value::Object(_)) => true,
            (ValueType::Array(elem), Value::Array(items)) => items.iter().all(|v| elem.admits(v)),
            _ => false,
        }
    }

    /// The narrowest descriptor for a value; arrays are typed by their
    /// elements when those agree and `Any` otherwise
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueType::nullable(ValueType::Any),
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
            Value::Object(_) => ValueType::Object,
            Value::Array(items) => {
                let elem = match items.first().map(ValueType::of) {
                    Some(first) if items.iter().all(|v| ValueType::of(v) == first) => first,
                    _ => ValueType::Any,
                };
                ValueType::array_of(elem)
            }
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Any => write!(f, "any"),
            ValueType::Bool => write!(f, "boolean"),
            ValueType::Int => write!(f, "integer"),
            ValueType::Float => write!(f, "float"),
            ValueType::String => write!(f, "string"),
            ValueType::Array(elem) => write!(f, "array<{elem}>"),
            ValueType::Object => write!(f, "object"),
            ValueType::Nullable(inner) => write!(f, "{inner}?"),
        }
    }
}
