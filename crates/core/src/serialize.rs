//! TypedValue, a serde-friendly mirror of Value
//!
//! Value itself cannot derive serde traits: the `Iterator` variant holds a
//! live protocol object, and `Arc<[Value]>` payloads are a representation
//! detail rather than a wire shape. TypedValue is the owned, fully
//! materialized mirror used at serialization boundaries (snapshots of
//! `to_values` output, fixtures, tooling). Conversion is explicit in both
//! directions and fallible in one: live iterators and non-finite floats
//! have no wire form.

use crate::record::Record;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Serializable mirror of [`Value`].
///
/// Records serialize as ordered key/value pair lists so the enumeration
/// order survives a round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypedValue {
    Undefined,
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    List(Vec<TypedValue>),
    Record(Vec<(String, TypedValue)>),
}

/// Conversion failures from [`Value`] to [`TypedValue`].
#[derive(Debug, Clone, PartialEq)]
pub enum SerializeError {
    /// Live protocol objects cannot be serialized
    IteratorNotSerializable,
    /// NaN and infinities have no interchange representation
    NonFiniteFloat(f64),
}

impl std::fmt::Display for SerializeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SerializeError::IteratorNotSerializable => {
                write!(f, "iterator values cannot be serialized")
            }
            SerializeError::NonFiniteFloat(x) => {
                write!(f, "non-finite float cannot be serialized: {}", x)
            }
        }
    }
}

impl std::error::Error for SerializeError {}

impl TypedValue {
    /// Deep conversion from a runtime value.
    pub fn from_value(value: &Value) -> Result<TypedValue, SerializeError> {
        match value {
            Value::Undefined => Ok(TypedValue::Undefined),
            Value::Int(n) => Ok(TypedValue::Int(*n)),
            Value::Float(x) => {
                if x.is_finite() {
                    Ok(TypedValue::Float(*x))
                } else {
                    Err(SerializeError::NonFiniteFloat(*x))
                }
            }
            Value::Bool(b) => Ok(TypedValue::Bool(*b)),
            Value::Str(s) => Ok(TypedValue::String(s.to_string())),
            Value::List(items) => {
                let converted = items
                    .iter()
                    .map(TypedValue::from_value)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(TypedValue::List(converted))
            }
            Value::Record(record) => {
                let mut pairs = Vec::with_capacity(record.len());
                for (key, val) in record.iter() {
                    pairs.push((key.to_string(), TypedValue::from_value(val)?));
                }
                Ok(TypedValue::Record(pairs))
            }
            Value::Iterator(_) => Err(SerializeError::IteratorNotSerializable),
        }
    }

    /// Deep conversion back into a runtime value. Total: every TypedValue
    /// has a Value form.
    pub fn to_value(&self) -> Value {
        match self {
            TypedValue::Undefined => Value::Undefined,
            TypedValue::Int(n) => Value::Int(*n),
            TypedValue::Float(x) => Value::Float(*x),
            TypedValue::Bool(b) => Value::Bool(*b),
            TypedValue::String(s) => Value::str(s.as_str()),
            TypedValue::List(items) => {
                Value::list(items.iter().map(TypedValue::to_value).collect())
            }
            TypedValue::Record(pairs) => {
                let mut record = Record::new();
                for (key, val) in pairs {
                    record.insert(key.as_str(), val.to_value());
                }
                Value::record(record)
            }
        }
    }
}
