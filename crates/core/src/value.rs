//! Core Value enum: what sequences carry
//!
//! This is pure data with cheaply cloneable payloads: strings, lists, and
//! records sit behind `Arc`, so duplicating a Value is O(1). The one
//! reference-typed variant is `Iterator`, which carries a shared protocol
//! object and compares by identity.
//!
//! The runtime is single-threaded (cooperative suspension, no parallel
//! execution), so protocol objects live behind `Rc<RefCell<..>>` rather
//! than a lock.

use crate::protocol::ObjRef;
use crate::record::Record;
use std::rc::Rc;
use std::sync::Arc;

/// A dynamic runtime value.
#[derive(Clone)]
pub enum Value {
    /// Absent value; also the implicit padding in longest-mode joins
    Undefined,

    /// Integer value
    Int(i64),

    /// Floating-point value (IEEE 754 double precision)
    Float(f64),

    /// Boolean value
    Bool(bool),

    /// Immutable string
    Str(Arc<str>),

    /// Immutable list of values
    List(Arc<[Value]>),

    /// Ordered key/value row (own keys only, exact order)
    Record(Arc<Record>),

    /// Iteration protocol object (user source or lazy sequence)
    Iterator(ObjRef),
}

impl Value {
    /// String value from anything string-like
    pub fn str(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    /// List value from a vector
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Arc::from(items))
    }

    /// Record value from an owned record
    pub fn record(record: Record) -> Self {
        Value::Record(Arc::new(record))
    }

    /// Truthiness under the dynamic-language convention:
    /// Undefined, false, 0, 0.0, NaN, and "" are falsy; everything else
    /// (including empty lists and records) is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0 && !x.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::List(_) | Value::Record(_) | Value::Iterator(_) => true,
        }
    }

    /// Kind name for error messages ("expected X, got Int")
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "Undefined",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Bool(_) => "Bool",
            Value::Str(_) => "Str",
            Value::List(_) => "List",
            Value::Record(_) => "Record",
            Value::Iterator(_) => "Iterator",
        }
    }
}

// Iterator values compare by identity; everything else structurally.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Iterator(a), Value::Iterator(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Int(n) => write!(f, "Int({})", n),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Record(r) => f.debug_tuple("Record").field(r).finish(),
            Value::Iterator(obj) => {
                write!(f, "Iterator({:p})", Rc::as_ptr(obj))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::protocol::{ProtocolIter, Step};
    use std::cell::RefCell;

    struct Nothing;

    impl ProtocolIter for Nothing {
        fn next(&mut self) -> Result<Step, Error> {
            Ok(Step::Done)
        }
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Undefined.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::Float(f64::NAN).is_truthy());
        assert!(!Value::str("").is_truthy());

        assert!(Value::Int(-1).is_truthy());
        assert!(Value::str("x").is_truthy());
        assert!(Value::list(vec![]).is_truthy());
        assert!(Value::record(Record::new()).is_truthy());
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(
            Value::list(vec![Value::Int(1), Value::str("a")]),
            Value::list(vec![Value::Int(1), Value::str("a")]),
        );
        assert_ne!(Value::Int(1), Value::Float(1.0));
    }

    #[test]
    fn test_iterator_identity_equality() {
        let a: ObjRef = Rc::new(RefCell::new(Nothing));
        let b: ObjRef = Rc::new(RefCell::new(Nothing));
        assert_eq!(Value::Iterator(a.clone()), Value::Iterator(a.clone()));
        assert_ne!(Value::Iterator(a), Value::Iterator(b));
    }

    #[test]
    fn test_clone_is_shallow() {
        let list = Value::list(vec![Value::Int(1), Value::Int(2)]);
        let copy = list.clone();
        match (&list, &copy) {
            (Value::List(a), Value::List(b)) => assert!(Arc::ptr_eq(a, b)),
            _ => panic!("expected List"),
        }
    }
}
