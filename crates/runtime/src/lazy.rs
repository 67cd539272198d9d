//! Lazy sequence state machines
//!
//! Each combinator is an explicit enum-state lowering of a suspend/resume
//! body: the struct fields are the locals that survive across suspension
//! (remaining count, call counter, inner handle) and `step` runs exactly one
//! logical pull cycle. The shapes differ per combinator (map and filter are
//! single-loop, flat_map is nested-loop, take and drop have early-exit
//! branches), so each gets its own machine rather than one generic engine.
//!
//! `SequenceInner` wraps a machine in the uniform lifecycle: NotStarted and
//! Suspended accept next/close, Executing is only reachable transiently
//! inside a next call, Completed is terminal and never touches the machine
//! again. Machine errors land the sequence in Completed.

use crate::closing::{abandon, close_all};
use crate::handle::Handle;
use crate::zip::ZipGroup;
use lace_core::{Error, ProtocolIter, Step, Value};
use std::collections::VecDeque;

/// User-supplied callback: (element, zero-based counter) to a value.
///
/// Mappers use the result directly; predicates go through truthiness.
pub type Callback = Box<dyn FnMut(Value, i64) -> Result<Value, Error>>;

/// Lifecycle of a lazy sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SeqState {
    NotStarted,
    Suspended,
    Executing,
    Completed,
}

/// Convert a limit value for take/drop.
///
/// Fractional limits truncate toward zero, positive infinity means
/// unbounded, NaN and negatives are range errors, non-numbers are type
/// errors.
pub(crate) fn to_limit(value: &Value) -> Result<i64, Error> {
    match value {
        Value::Int(n) => {
            if *n < 0 {
                Err(Error::range_err(format!("limit must be non-negative: {}", n)))
            } else {
                Ok(*n)
            }
        }
        Value::Float(x) => {
            if x.is_nan() {
                Err(Error::range_err("limit must not be NaN"))
            } else if *x < 0.0 {
                Err(Error::range_err(format!("limit must be non-negative: {}", x)))
            } else if *x >= i64::MAX as f64 {
                Ok(i64::MAX)
            } else {
                Ok(x.trunc() as i64)
            }
        }
        other => Err(Error::type_err(format!(
            "limit must be a number, got {}",
            other.type_name()
        ))),
    }
}

/// One combinator's suspended body.
pub(crate) enum Machine {
    Wrap(WrapMachine),
    Map(MapMachine),
    Filter(FilterMachine),
    Take(TakeMachine),
    Drop(DropMachine),
    FlatMap(FlatMapMachine),
    Concat(ConcatMachine),
    Zip(ZipGroup),
}

impl Machine {
    fn step(&mut self) -> Result<Step, Error> {
        match self {
            Machine::Wrap(m) => m.step(),
            Machine::Map(m) => m.step(),
            Machine::Filter(m) => m.step(),
            Machine::Take(m) => m.step(),
            Machine::Drop(m) => m.step(),
            Machine::FlatMap(m) => m.step(),
            Machine::Concat(m) => m.step(),
            Machine::Zip(m) => m.step(),
        }
    }

    /// Release held handles on caller-invoked close.
    ///
    /// Single-source machines close their source even when the sequence was
    /// never pulled; the zip group in that case marks itself finished
    /// without touching any handle.
    fn release(&mut self, started: bool) -> Result<Step, Error> {
        match self {
            Machine::Wrap(m) => release_single(&mut m.source),
            Machine::Map(m) => release_single(&mut m.source),
            Machine::Filter(m) => release_single(&mut m.source),
            Machine::Take(m) => release_single(&mut m.source),
            Machine::Drop(m) => release_single(&mut m.source),
            Machine::FlatMap(m) => {
                let mut slots = [m.source.take(), m.inner.take()];
                close_all(&mut slots, Ok(Step::Done))
            }
            Machine::Concat(m) => {
                m.items.clear();
                release_single(&mut m.active)
            }
            Machine::Zip(m) => {
                if started {
                    m.release()
                } else {
                    Ok(Step::Done)
                }
            }
        }
    }
}

fn release_single(slot: &mut Option<Handle>) -> Result<Step, Error> {
    match slot.take() {
        Some(handle) => {
            handle.close()?;
            Ok(Step::Done)
        }
        None => Ok(Step::Done),
    }
}

/// A machine under the uniform sequence lifecycle.
pub(crate) struct SequenceInner {
    state: SeqState,
    machine: Machine,
}

impl SequenceInner {
    pub(crate) fn new(machine: Machine) -> SequenceInner {
        SequenceInner {
            state: SeqState::NotStarted,
            machine,
        }
    }
}

impl ProtocolIter for SequenceInner {
    fn next(&mut self) -> Result<Step, Error> {
        if self.state == SeqState::Completed {
            return Ok(Step::Done);
        }
        self.state = SeqState::Executing;
        let result = self.machine.step();
        self.state = match &result {
            Ok(Step::Value(_)) => SeqState::Suspended,
            Ok(Step::Done) | Err(_) => SeqState::Completed,
        };
        result
    }

    fn close(&mut self) -> Result<Step, Error> {
        if self.state == SeqState::Completed {
            return Ok(Step::Done);
        }
        let started = self.state == SeqState::Suspended;
        self.state = SeqState::Completed;
        self.machine.release(started)
    }

    fn is_sequence(&self) -> bool {
        true
    }
}

/// Thin delegating wrapper over a bare source (the `from` entry point).
pub(crate) struct WrapMachine {
    source: Option<Handle>,
}

impl WrapMachine {
    pub(crate) fn new(source: Handle) -> WrapMachine {
        WrapMachine {
            source: Some(source),
        }
    }

    fn step(&mut self) -> Result<Step, Error> {
        let step = match &self.source {
            Some(source) => source.pull()?,
            None => return Ok(Step::Done),
        };
        if step.is_done() {
            self.source = None;
        }
        Ok(step)
    }
}

pub(crate) struct MapMachine {
    source: Option<Handle>,
    mapper: Callback,
    counter: i64,
}

impl MapMachine {
    pub(crate) fn new(source: Handle, mapper: Callback) -> MapMachine {
        MapMachine {
            source: Some(source),
            mapper,
            counter: 0,
        }
    }

    fn step(&mut self) -> Result<Step, Error> {
        let step = match &self.source {
            Some(source) => source.pull()?,
            None => return Ok(Step::Done),
        };
        match step {
            Step::Done => {
                self.source = None;
                Ok(Step::Done)
            }
            Step::Value(value) => {
                let n = self.counter;
                self.counter += 1;
                match (self.mapper)(value, n) {
                    Ok(mapped) => Ok(Step::Value(mapped)),
                    Err(err) => {
                        abandon(&mut self.source);
                        Err(err)
                    }
                }
            }
        }
    }
}

pub(crate) struct FilterMachine {
    source: Option<Handle>,
    predicate: Callback,
    counter: i64,
}

impl FilterMachine {
    pub(crate) fn new(source: Handle, predicate: Callback) -> FilterMachine {
        FilterMachine {
            source: Some(source),
            predicate,
            counter: 0,
        }
    }

    fn step(&mut self) -> Result<Step, Error> {
        loop {
            let step = match &self.source {
                Some(source) => source.pull()?,
                None => return Ok(Step::Done),
            };
            match step {
                Step::Done => {
                    self.source = None;
                    return Ok(Step::Done);
                }
                Step::Value(value) => {
                    // The counter advances on every pull, accepted or not
                    let n = self.counter;
                    self.counter += 1;
                    match (self.predicate)(value.clone(), n) {
                        Ok(verdict) => {
                            if verdict.is_truthy() {
                                return Ok(Step::Value(value));
                            }
                        }
                        Err(err) => {
                            abandon(&mut self.source);
                            return Err(err);
                        }
                    }
                }
            }
        }
    }
}

pub(crate) struct TakeMachine {
    source: Option<Handle>,
    remaining: i64,
}

impl TakeMachine {
    pub(crate) fn new(source: Handle, limit: i64) -> TakeMachine {
        TakeMachine {
            source: Some(source),
            remaining: limit,
        }
    }

    fn step(&mut self) -> Result<Step, Error> {
        // take(0) closes without ever pulling
        if self.remaining == 0 {
            release_single(&mut self.source)?;
            return Ok(Step::Done);
        }
        let step = match &self.source {
            Some(source) => source.pull()?,
            None => return Ok(Step::Done),
        };
        match step {
            Step::Done => {
                self.source = None;
                Ok(Step::Done)
            }
            Step::Value(value) => {
                self.remaining -= 1;
                if self.remaining == 0 {
                    // Close in the same cycle that yields the final value,
                    // so the caller needs no extra next() to trigger cleanup
                    release_single(&mut self.source)?;
                }
                Ok(Step::Value(value))
            }
        }
    }
}

pub(crate) struct DropMachine {
    source: Option<Handle>,
    remaining: i64,
}

impl DropMachine {
    pub(crate) fn new(source: Handle, limit: i64) -> DropMachine {
        DropMachine {
            source: Some(source),
            remaining: limit,
        }
    }

    fn step(&mut self) -> Result<Step, Error> {
        loop {
            let step = match &self.source {
                Some(source) => source.pull()?,
                None => return Ok(Step::Done),
            };
            match step {
                Step::Done => {
                    // Natural exhaustion, even mid-discard, needs no close
                    self.source = None;
                    return Ok(Step::Done);
                }
                Step::Value(value) => {
                    if self.remaining > 0 {
                        self.remaining -= 1;
                    } else {
                        return Ok(Step::Value(value));
                    }
                }
            }
        }
    }
}

pub(crate) struct FlatMapMachine {
    source: Option<Handle>,
    mapper: Callback,
    counter: i64,
    inner: Option<Handle>,
}

impl FlatMapMachine {
    pub(crate) fn new(source: Handle, mapper: Callback) -> FlatMapMachine {
        FlatMapMachine {
            source: Some(source),
            mapper,
            counter: 0,
            inner: None,
        }
    }

    fn step(&mut self) -> Result<Step, Error> {
        loop {
            if let Some(inner) = &self.inner {
                match inner.pull() {
                    Ok(Step::Value(value)) => return Ok(Step::Value(value)),
                    Ok(Step::Done) => {
                        self.inner = None;
                    }
                    Err(err) => {
                        // The inner source threw; it is not closed, the
                        // outer source is
                        self.inner = None;
                        abandon(&mut self.source);
                        return Err(err);
                    }
                }
                continue;
            }
            let step = match &self.source {
                Some(source) => source.pull()?,
                None => return Ok(Step::Done),
            };
            match step {
                Step::Done => {
                    self.source = None;
                    return Ok(Step::Done);
                }
                Step::Value(value) => {
                    let n = self.counter;
                    self.counter += 1;
                    let mapped = match (self.mapper)(value, n) {
                        Ok(mapped) => mapped,
                        Err(err) => {
                            abandon(&mut self.source);
                            return Err(err);
                        }
                    };
                    // Inner sequences never admit strings
                    match Handle::from_value(&mapped, true) {
                        Ok(inner) => self.inner = Some(inner),
                        Err(err) => {
                            abandon(&mut self.source);
                            return Err(err);
                        }
                    }
                }
            }
        }
    }
}

/// Sequential flattening of a fixed argument list (concat).
pub(crate) struct ConcatMachine {
    items: VecDeque<Value>,
    active: Option<Handle>,
}

impl ConcatMachine {
    pub(crate) fn new(items: Vec<Value>) -> ConcatMachine {
        ConcatMachine {
            items: items.into(),
            active: None,
        }
    }

    fn step(&mut self) -> Result<Step, Error> {
        loop {
            if let Some(active) = &self.active {
                match active.pull() {
                    Ok(Step::Value(value)) => return Ok(Step::Value(value)),
                    Ok(Step::Done) => {
                        self.active = None;
                    }
                    Err(err) => {
                        self.active = None;
                        return Err(err);
                    }
                }
                continue;
            }
            match self.items.pop_front() {
                None => return Ok(Step::Done),
                Some(item) => {
                    // Each input's iterator is obtained only when its turn
                    // arrives
                    self.active = Some(Handle::from_value(&item, true)?);
                }
            }
        }
    }
}
