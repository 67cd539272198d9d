//! Joining engine: synchronized iteration over a group of sources
//!
//! `zip` aligns an ordered list of iterables, `zip_keyed` aligns the values
//! of a record, and both feed the same `ZipGroup` machine. A group owns one
//! handle per input plus a padding value per slot; a `None` slot marks a
//! source that already finished. Three termination policies:
//!
//! - shortest: the first exhausted source ends the group; the partial round
//!   is discarded and the remaining sources are closed in reverse order.
//! - strict: all sources must finish on the same round. When slot 0
//!   exhausts, every other slot is probed once; a value from any probe is a
//!   length mismatch.
//! - longest: an exhausted slot is replaced by its padding value until
//!   every slot has finished.
//!
//! Construction is the only eager phase: it validates arguments, obtains
//! one handle per input (an observable side effect, in input order), and in
//! longest mode materializes the padding values up front. Nothing is pulled
//! from the group's sources until the first `next`.

use crate::closing::{close_all, close_all_quietly, close_quietly};
use crate::handle::Handle;
use lace_core::{Error, Record, Step, Value};
use std::sync::Arc;
use tracing::{debug, trace};

/// Termination policy for a zip group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ZipMode {
    Shortest,
    Longest,
    Strict,
}

/// Row assembly: positional list for zip, keyed record for zip_keyed.
#[derive(Debug)]
pub(crate) enum RowShape {
    Positional,
    Keyed(Vec<Arc<str>>),
}

#[derive(Debug)]
pub(crate) struct ZipGroup {
    iters: Vec<Option<Handle>>,
    mode: ZipMode,
    padding: Vec<Value>,
    shape: RowShape,
}

fn is_object(value: &Value) -> bool {
    matches!(
        value,
        Value::List(_) | Value::Record(_) | Value::Iterator(_)
    )
}

/// Read `{ mode, padding }` from an options value.
///
/// The read order is observable and fixed: mode first, padding only when
/// mode resolved to longest. Unknown keys are ignored.
fn parse_options(options: &Value) -> Result<(ZipMode, Option<Value>), Error> {
    let record = match options {
        Value::Undefined => None,
        Value::Record(record) => Some(record),
        other => {
            return Err(Error::type_err(format!(
                "options must be a record or undefined, got {}",
                other.type_name()
            )));
        }
    };

    let mode_value = record
        .and_then(|r| r.get("mode"))
        .cloned()
        .unwrap_or(Value::Undefined);
    let mode = match &mode_value {
        Value::Undefined => ZipMode::Shortest,
        Value::Str(s) => match s.as_ref() {
            "shortest" => ZipMode::Shortest,
            "longest" => ZipMode::Longest,
            "strict" => ZipMode::Strict,
            other => {
                return Err(Error::type_err(format!("invalid mode: {:?}", other)));
            }
        },
        other => {
            return Err(Error::type_err(format!(
                "invalid mode: {}",
                other.type_name()
            )));
        }
    };

    let padding = if mode == ZipMode::Longest {
        let padding_value = record
            .and_then(|r| r.get("padding"))
            .cloned()
            .unwrap_or(Value::Undefined);
        match padding_value {
            Value::Undefined => None,
            value if is_object(&value) => Some(value),
            other => {
                return Err(Error::type_err(format!(
                    "padding must be an object, got {}",
                    other.type_name()
                )));
            }
        }
    } else {
        None
    };

    Ok((mode, padding))
}

/// Build the positional zip group.
pub(crate) fn build_zip(iterables: &Value, options: &Value) -> Result<ZipGroup, Error> {
    // The first argument is checked before options are examined
    if !is_object(iterables) {
        return Err(Error::type_err(format!(
            "zip requires an object of iterables, got {}",
            iterables.type_name()
        )));
    }
    let (mode, padding_option) = parse_options(options)?;

    let outer = Handle::from_value(iterables, true)?;
    let mut iters: Vec<Option<Handle>> = Vec::new();
    loop {
        let step = match outer.pull() {
            Ok(step) => step,
            Err(err) => {
                close_all_quietly(&mut iters);
                return Err(err);
            }
        };
        match step {
            Step::Done => break,
            Step::Value(value) => match Handle::from_value(&value, true) {
                Ok(handle) => iters.push(Some(handle)),
                Err(err) => {
                    close_all_quietly(&mut iters);
                    close_quietly(&outer);
                    return Err(err);
                }
            },
        }
    }

    let padding = materialize_zip_padding(&mut iters, &mode, padding_option)?;
    debug!(count = iters.len(), mode = ?mode, "zip group constructed");
    Ok(ZipGroup {
        iters,
        mode,
        padding,
        shape: RowShape::Positional,
    })
}

/// Pull one padding value per slot from an explicit padding iterable.
///
/// A padding source that finishes early leaves the rest of the slots at
/// Undefined; one that still has items when enough were drawn is closed
/// exactly once. Natural exhaustion needs no close.
fn materialize_zip_padding(
    iters: &mut Vec<Option<Handle>>,
    mode: &ZipMode,
    padding_option: Option<Value>,
) -> Result<Vec<Value>, Error> {
    let count = iters.len();
    let Some(padding_value) = padding_option else {
        return Ok(vec![Value::Undefined; count]);
    };
    debug_assert_eq!(*mode, ZipMode::Longest);

    let padding_iter = match Handle::from_value(&padding_value, true) {
        Ok(handle) => handle,
        Err(err) => {
            close_all_quietly(iters);
            return Err(err);
        }
    };
    let mut padding = Vec::with_capacity(count);
    let mut using_iterator = true;
    for _ in 0..count {
        if using_iterator {
            match padding_iter.pull() {
                Ok(Step::Value(value)) => padding.push(value),
                Ok(Step::Done) => using_iterator = false,
                Err(err) => {
                    close_all_quietly(iters);
                    return Err(err);
                }
            }
        }
        if !using_iterator {
            padding.push(Value::Undefined);
        }
    }
    if using_iterator {
        if let Err(err) = padding_iter.close() {
            close_all_quietly(iters);
            return Err(err);
        }
    }
    Ok(padding)
}

/// Build the keyed zip group.
///
/// Keys are captured once, in the record's own-key order, and fix both the
/// pull order of every round and the shape of every yielded row. Keys whose
/// value is Undefined are skipped entirely.
pub(crate) fn build_zip_keyed(iterables: &Value, options: &Value) -> Result<ZipGroup, Error> {
    if !is_object(iterables) {
        return Err(Error::type_err(format!(
            "zip_keyed requires a record of iterables, got {}",
            iterables.type_name()
        )));
    }
    let (mode, padding_option) = parse_options(options)?;

    let record = match iterables {
        Value::Record(record) => record.clone(),
        other => {
            return Err(Error::type_err(format!(
                "cannot enumerate keys of {}",
                other.type_name()
            )));
        }
    };

    let mut keys: Vec<Arc<str>> = Vec::new();
    let mut iters: Vec<Option<Handle>> = Vec::new();
    for key in record.own_keys() {
        let value = record.get(&key).cloned().unwrap_or(Value::Undefined);
        if matches!(value, Value::Undefined) {
            continue;
        }
        match Handle::from_value(&value, true) {
            Ok(handle) => {
                keys.push(key);
                iters.push(Some(handle));
            }
            Err(err) => {
                close_all_quietly(&mut iters);
                return Err(err);
            }
        }
    }

    let count = iters.len();
    let padding = match padding_option {
        None => vec![Value::Undefined; count],
        Some(padding_value) => {
            let pad_record = match &padding_value {
                Value::Record(record) => record.clone(),
                other => {
                    close_all_quietly(&mut iters);
                    return Err(Error::type_err(format!(
                        "padding must be a record of per-key values, got {}",
                        other.type_name()
                    )));
                }
            };
            keys.iter()
                .map(|key| pad_record.get(key).cloned().unwrap_or(Value::Undefined))
                .collect()
        }
    };

    debug!(count, mode = ?mode, "keyed zip group constructed");
    Ok(ZipGroup {
        iters,
        mode,
        padding,
        shape: RowShape::Keyed(keys),
    })
}

impl ZipGroup {
    /// Run one round: pull every live slot in index order and assemble a
    /// row, or finish per the termination policy.
    pub(crate) fn step(&mut self) -> Result<Step, Error> {
        let count = self.iters.len();
        if count == 0 {
            return Ok(Step::Done);
        }
        let mut results: Vec<Value> = Vec::with_capacity(count);
        let mut i = 0;
        while i < count {
            let pulled = match &self.iters[i] {
                Some(handle) => Some(handle.pull()),
                None => None,
            };
            let Some(result) = pulled else {
                // Only reachable in longest mode; in the other modes the
                // group ends the instant any slot closes
                results.push(self.padding[i].clone());
                i += 1;
                continue;
            };
            let step = match result {
                Ok(step) => step,
                Err(err) => {
                    // The thrower is not closed, its siblings are
                    self.iters[i] = None;
                    return close_all(&mut self.iters, Err(err));
                }
            };
            match step {
                Step::Value(value) => results.push(value),
                Step::Done => {
                    self.iters[i] = None;
                    match self.mode {
                        ZipMode::Shortest => {
                            trace!(slot = i, "shortest-mode source exhausted, closing group");
                            return close_all(&mut self.iters, Ok(Step::Done));
                        }
                        ZipMode::Strict => return self.finish_strict(i),
                        ZipMode::Longest => {
                            results.push(self.padding[i].clone());
                            if self.iters.iter().all(Option::is_none) {
                                return Ok(Step::Done);
                            }
                        }
                    }
                }
            }
            i += 1;
        }
        Ok(Step::Value(self.finish_row(results)))
    }

    /// Strict-mode endgame after slot `i` exhausted.
    ///
    /// Legal only when slot 0 ends the round; every later slot is then
    /// probed once and must also be exhausted.
    fn finish_strict(&mut self, i: usize) -> Result<Step, Error> {
        if i != 0 {
            debug!(slot = i, "strict joint iteration length mismatch");
            return close_all(&mut self.iters, Err(Error::LengthMismatch));
        }
        for k in 1..self.iters.len() {
            let probe = match &self.iters[k] {
                Some(handle) => handle.pull(),
                None => continue,
            };
            match probe {
                Ok(Step::Done) => self.iters[k] = None,
                Ok(Step::Value(_)) => {
                    debug!(slot = k, "strict joint iteration length mismatch");
                    return close_all(&mut self.iters, Err(Error::LengthMismatch));
                }
                Err(err) => {
                    self.iters[k] = None;
                    return close_all(&mut self.iters, Err(err));
                }
            }
        }
        Ok(Step::Done)
    }

    /// Release every remaining open slot (caller-invoked close).
    pub(crate) fn release(&mut self) -> Result<Step, Error> {
        close_all(&mut self.iters, Ok(Step::Done))
    }

    fn finish_row(&self, results: Vec<Value>) -> Value {
        match &self.shape {
            RowShape::Positional => Value::list(results),
            RowShape::Keyed(keys) => {
                let mut row = Record::new();
                for (key, value) in keys.iter().zip(results) {
                    row.insert(key.clone(), value);
                }
                Value::record(row)
            }
        }
    }
}
