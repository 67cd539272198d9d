//! Step type and the ProtocolIter trait
//!
//! The iteration protocol is the sole contract between sources and
//! combinators: a source yields one `Step` per pull and may optionally
//! support early release via `close`. Absence of close behavior is modeled
//! by the default method, which returns a synthetic Done step - a missing
//! close is a no-op, never an error.

use crate::error::Error;
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// One pull outcome: exhaustion or a carried value.
///
/// A Step is consumed immediately by the combinator that pulled it and is
/// never stored beyond one pull cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The source has no more values
    Done,
    /// The next value in the sequence
    Value(Value),
}

impl Step {
    /// True if this step signals exhaustion
    pub fn is_done(&self) -> bool {
        matches!(self, Step::Done)
    }
}

/// The iteration protocol spoken by every source object.
///
/// Implementors include the built-in list/char sources, user-supplied
/// sources, and every lazy sequence produced by a combinator (sequences are
/// themselves valid sources, which is what makes `a.filter(p).map(f)`
/// compose).
///
/// `next` must not be called re-entrantly; the runtime is single-threaded
/// and a source is exclusively owned by one combinator frame at a time.
pub trait ProtocolIter {
    /// Produce the next step of the sequence
    fn next(&mut self) -> Result<Step, Error>;

    /// Release the source before natural exhaustion.
    ///
    /// Safe to call after exhaustion. Sources without close behavior keep
    /// the default, which reports Done without touching anything.
    fn close(&mut self) -> Result<Step, Error> {
        Ok(Step::Done)
    }

    /// True for lazy sequences built by the runtime crate.
    ///
    /// Used by `from_value` to return an already-conforming object
    /// unchanged instead of wrapping it again.
    fn is_sequence(&self) -> bool {
        false
    }
}

/// Shared reference to a protocol object.
///
/// Reference semantics mirror the source language of the protocol: handing
/// an iterator to a combinator transfers ownership by convention, not by
/// move. Identity comparisons go through `Rc::ptr_eq`.
pub type ObjRef = Rc<RefCell<dyn ProtocolIter>>;
