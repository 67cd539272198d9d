//! Source Protocol Adapter: normalized handles over iterable values
//!
//! A `Handle` is the runtime's sole view of an underlying source. It wraps
//! the shared protocol object and exposes `pull`/`close`. Handles are
//! exclusively owned by one combinator frame at a time; handing one to a
//! parent combinator transfers ownership by convention.
//!
//! `Handle::from_value` is the flattening entry point: it accepts a value
//! that is already a protocol object, or a built-in iterable (list, and
//! string unless the caller rejects strings), and produces a handle over it.

use lace_core::{Error, ObjRef, ProtocolIter, Step, Value};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

/// Exclusive pull/close access to one underlying source.
pub struct Handle {
    obj: ObjRef,
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle").finish_non_exhaustive()
    }
}

impl Handle {
    /// Handle over an existing protocol object
    pub fn new(obj: ObjRef) -> Handle {
        Handle { obj }
    }

    /// Obtain a handle from an iterable value.
    ///
    /// Accepts protocol objects directly and flattens built-in iterables
    /// (lists always; strings only when `reject_strings` is false, which is
    /// the top-level entry point's privilege). Everything else fails with a
    /// type error before any source is touched.
    pub fn from_value(value: &Value, reject_strings: bool) -> Result<Handle, Error> {
        match value {
            Value::Iterator(obj) => Ok(Handle::new(obj.clone())),
            Value::List(items) => Ok(Handle::new(Rc::new(RefCell::new(ListSource::new(
                items.clone(),
            ))))),
            Value::Str(s) => {
                if reject_strings {
                    Err(Error::type_err("strings are not iterable here"))
                } else {
                    Ok(Handle::new(Rc::new(RefCell::new(CharSource::new(
                        s.clone(),
                    )))))
                }
            }
            other => Err(Error::type_err(format!(
                "{} is not iterable",
                other.type_name()
            ))),
        }
    }

    /// Produce the next step of the underlying source
    pub fn pull(&self) -> Result<Step, Error> {
        self.obj.borrow_mut().next()
    }

    /// Release the underlying source
    pub fn close(&self) -> Result<Step, Error> {
        self.obj.borrow_mut().close()
    }

    /// Shared reference to the wrapped protocol object
    pub fn obj(&self) -> ObjRef {
        self.obj.clone()
    }
}

/// Built-in source over a list's elements, in order.
pub struct ListSource {
    items: Arc<[Value]>,
    index: usize,
}

impl ListSource {
    pub fn new(items: Arc<[Value]>) -> ListSource {
        ListSource { items, index: 0 }
    }
}

impl ProtocolIter for ListSource {
    fn next(&mut self) -> Result<Step, Error> {
        match self.items.get(self.index) {
            Some(value) => {
                self.index += 1;
                Ok(Step::Value(value.clone()))
            }
            None => Ok(Step::Done),
        }
    }
}

/// Built-in source over a string's characters, one single-char string each.
pub struct CharSource {
    text: Arc<str>,
    byte_pos: usize,
}

impl CharSource {
    pub fn new(text: Arc<str>) -> CharSource {
        CharSource { text, byte_pos: 0 }
    }
}

impl ProtocolIter for CharSource {
    fn next(&mut self) -> Result<Step, Error> {
        match self.text[self.byte_pos..].chars().next() {
            Some(ch) => {
                self.byte_pos += ch.len_utf8();
                Ok(Step::Value(Value::str(ch.to_string())))
            }
            None => Ok(Step::Done),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_source_yields_in_order() {
        let handle =
            Handle::from_value(&Value::list(vec![Value::Int(1), Value::Int(2)]), true).unwrap();
        assert_eq!(handle.pull(), Ok(Step::Value(Value::Int(1))));
        assert_eq!(handle.pull(), Ok(Step::Value(Value::Int(2))));
        assert_eq!(handle.pull(), Ok(Step::Done));
        // Pulling past exhaustion stays Done
        assert_eq!(handle.pull(), Ok(Step::Done));
    }

    #[test]
    fn test_char_source_is_per_character() {
        let handle = Handle::from_value(&Value::str("héj"), false).unwrap();
        assert_eq!(handle.pull(), Ok(Step::Value(Value::str("h"))));
        assert_eq!(handle.pull(), Ok(Step::Value(Value::str("é"))));
        assert_eq!(handle.pull(), Ok(Step::Value(Value::str("j"))));
        assert_eq!(handle.pull(), Ok(Step::Done));
    }

    #[test]
    fn test_strings_rejected_when_flattening() {
        let err = Handle::from_value(&Value::str("abc"), true).unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }

    #[test]
    fn test_non_iterables_rejected() {
        for value in [Value::Int(3), Value::Bool(true), Value::Undefined] {
            assert!(matches!(
                Handle::from_value(&value, false),
                Err(Error::Type(_))
            ));
        }
    }

    #[test]
    fn test_iterator_value_is_taken_directly() {
        struct One(bool);
        impl ProtocolIter for One {
            fn next(&mut self) -> Result<Step, Error> {
                if self.0 {
                    self.0 = false;
                    Ok(Step::Value(Value::Int(7)))
                } else {
                    Ok(Step::Done)
                }
            }
        }
        let obj: ObjRef = Rc::new(RefCell::new(One(true)));
        let handle = Handle::from_value(&Value::Iterator(obj.clone()), true).unwrap();
        assert!(Rc::ptr_eq(&handle.obj(), &obj));
        assert_eq!(handle.pull(), Ok(Step::Value(Value::Int(7))));
    }
}
