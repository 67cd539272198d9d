//! Instrumented sources for observing protocol traffic
//!
//! The closing discipline and the joining engine make promises about call
//! order ("close B before A", "never pull after Done") that plain sources
//! cannot witness. A `ProbeSource` records every pull and close into a
//! shared event log and can be told to fail at a chosen pull or on close,
//! which is how those promises get exercised.

use lace_core::{Error, ObjRef, ProtocolIter, Step, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// Shared, append-only log of protocol events.
pub type EventLog = Rc<RefCell<Vec<String>>>;

/// Fresh empty event log
pub fn new_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Snapshot of a log's events
pub fn events(log: &EventLog) -> Vec<String> {
    log.borrow().clone()
}

/// A source that yields a fixed list of values and records its traffic.
pub struct ProbeSource {
    name: String,
    items: Vec<Value>,
    index: usize,
    pulls: usize,
    log: EventLog,
    fail_pull_at: Option<usize>,
    fail_close: bool,
}

impl ProbeSource {
    pub fn new(name: &str, items: Vec<Value>, log: &EventLog) -> ProbeSource {
        ProbeSource {
            name: name.to_string(),
            items,
            index: 0,
            pulls: 0,
            log: log.clone(),
            fail_pull_at: None,
            fail_close: false,
        }
    }

    /// Fail the nth pull (zero-based) with a custom error
    pub fn fail_pull_at(mut self, n: usize) -> ProbeSource {
        self.fail_pull_at = Some(n);
        self
    }

    /// Fail every close with a custom error
    pub fn fail_close(mut self) -> ProbeSource {
        self.fail_close = true;
        self
    }

    /// Finish construction as a shared protocol object
    pub fn into_obj(self) -> ObjRef {
        Rc::new(RefCell::new(self))
    }

    /// Finish construction as an iterable value
    pub fn into_value(self) -> Value {
        Value::Iterator(self.into_obj())
    }
}

impl ProtocolIter for ProbeSource {
    fn next(&mut self) -> Result<Step, Error> {
        let n = self.pulls;
        self.pulls += 1;
        self.log.borrow_mut().push(format!("{}.pull", self.name));
        if self.fail_pull_at == Some(n) {
            return Err(Error::custom(format!("{} pull failure", self.name)));
        }
        match self.items.get(self.index) {
            Some(value) => {
                self.index += 1;
                Ok(Step::Value(value.clone()))
            }
            None => Ok(Step::Done),
        }
    }

    fn close(&mut self) -> Result<Step, Error> {
        self.log.borrow_mut().push(format!("{}.close", self.name));
        if self.fail_close {
            Err(Error::custom(format!("{} close failure", self.name)))
        } else {
            Ok(Step::Done)
        }
    }
}

/// Integer list value, a shorthand for fixture construction
pub fn int_list(ns: &[i64]) -> Value {
    Value::list(ns.iter().map(|n| Value::Int(*n)).collect())
}

/// Single-character string values from a str, as a list value
pub fn str_list(items: &[&str]) -> Value {
    Value::list(items.iter().map(|s| Value::str(*s)).collect())
}
