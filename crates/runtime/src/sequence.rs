//! Sequence: the public lazy-composition surface
//!
//! A `Sequence` is a cheap reference handle over a `SequenceInner` state
//! machine. Reference semantics are deliberate: `from_value` on a value
//! that already carries a sequence returns the same object rather than
//! wrapping it again, and passing a sequence into a combinator transfers
//! ownership by convention.
//!
//! Construction performs validation only; no source is pulled until the
//! first `next`. Obtaining each input's iterator (zip, zip_keyed) is the
//! one observable construction side effect.

use crate::handle::Handle;
use crate::lazy::{
    to_limit, Callback, ConcatMachine, DropMachine, FilterMachine, FlatMapMachine, Machine,
    MapMachine, SequenceInner, TakeMachine, WrapMachine,
};
use crate::zip::{build_zip, build_zip_keyed};
use lace_core::{Error, ObjRef, Step, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// A lazy sequence of values.
#[derive(Clone)]
pub struct Sequence {
    obj: ObjRef,
}

impl Sequence {
    fn from_machine(machine: Machine) -> Sequence {
        Sequence {
            obj: Rc::new(RefCell::new(SequenceInner::new(machine))),
        }
    }

    /// Entry point: a sequence over any iterable value.
    ///
    /// Identity-preserving: a value that already carries a sequence comes
    /// back unchanged. A bare protocol object gets a thin wrapper that
    /// delegates next and close one for one. Strings are allowed here, and
    /// only here, iterating per character.
    pub fn from_value(value: &Value) -> Result<Sequence, Error> {
        if let Value::Iterator(obj) = value {
            if obj.borrow().is_sequence() {
                return Ok(Sequence { obj: obj.clone() });
            }
        }
        let source = Handle::from_value(value, false)?;
        Ok(Sequence::from_machine(Machine::Wrap(WrapMachine::new(
            source,
        ))))
    }

    /// This sequence as a handle, for feeding a downstream combinator
    fn source(&self) -> Handle {
        Handle::new(self.obj.clone())
    }

    /// Pull the next step
    pub fn next(&self) -> Result<Step, Error> {
        self.obj.borrow_mut().next()
    }

    /// Terminate early, releasing underlying sources
    pub fn close(&self) -> Result<Step, Error> {
        self.obj.borrow_mut().close()
    }

    /// This sequence as a value
    pub fn to_value(&self) -> Value {
        Value::Iterator(self.obj.clone())
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Sequence) -> bool {
        Rc::ptr_eq(&self.obj, &other.obj)
    }

    /// Transform each element with `mapper(element, counter)`
    pub fn map(&self, mapper: Callback) -> Sequence {
        Sequence::from_machine(Machine::Map(MapMachine::new(self.source(), mapper)))
    }

    /// Keep elements for which `predicate(element, counter)` is truthy
    pub fn filter(&self, predicate: Callback) -> Sequence {
        Sequence::from_machine(Machine::Filter(FilterMachine::new(
            self.source(),
            predicate,
        )))
    }

    /// At most `limit` leading elements; the source is closed as soon as
    /// the limit is reached
    pub fn take(&self, limit: &Value) -> Result<Sequence, Error> {
        let limit = to_limit(limit)?;
        Ok(Sequence::from_machine(Machine::Take(TakeMachine::new(
            self.source(),
            limit,
        ))))
    }

    /// Discard `limit` leading elements, then pass the rest through
    pub fn drop(&self, limit: &Value) -> Result<Sequence, Error> {
        let limit = to_limit(limit)?;
        Ok(Sequence::from_machine(Machine::Drop(DropMachine::new(
            self.source(),
            limit,
        ))))
    }

    /// Map each element to an iterable and drain each result in order.
    /// Mapper results may not be strings.
    pub fn flat_map(&self, mapper: Callback) -> Sequence {
        Sequence::from_machine(Machine::FlatMap(FlatMapMachine::new(
            self.source(),
            mapper,
        )))
    }

    /// Sequential flattening of several iterables.
    ///
    /// Inputs are validated up front but each one's iterator is obtained
    /// only when its turn arrives.
    pub fn concat(items: Vec<Value>) -> Result<Sequence, Error> {
        for item in &items {
            if !matches!(item, Value::Iterator(_) | Value::List(_)) {
                return Err(Error::type_err(format!(
                    "{} is not iterable",
                    item.type_name()
                )));
            }
        }
        Ok(Sequence::from_machine(Machine::Concat(ConcatMachine::new(
            items,
        ))))
    }

    /// Joint iteration over an ordered list of iterables, yielding
    /// positional list rows
    pub fn zip(iterables: &Value, options: &Value) -> Result<Sequence, Error> {
        Ok(Sequence::from_machine(Machine::Zip(build_zip(
            iterables, options,
        )?)))
    }

    /// Joint iteration over a record of iterables, yielding record rows in
    /// the input's own-key order
    pub fn zip_keyed(iterables: &Value, options: &Value) -> Result<Sequence, Error> {
        Ok(Sequence::from_machine(Machine::Zip(build_zip_keyed(
            iterables, options,
        )?)))
    }
}

impl TryFrom<Value> for Sequence {
    type Error = Error;

    fn try_from(value: Value) -> Result<Sequence, Error> {
        Sequence::from_value(&value)
    }
}

impl std::fmt::Debug for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sequence({:p})", Rc::as_ptr(&self.obj))
    }
}
