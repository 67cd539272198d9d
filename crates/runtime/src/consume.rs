//! Terminal consumers: eager drivers over a sequence
//!
//! These drive a sequence to an answer. The short-circuiting trio (some,
//! every, find) deliberately leaves the sequence open when the answer
//! arrives before exhaustion; only take and the joining engine close
//! proactively. A failing callback, on the other hand, does close the
//! driven sequence before the error propagates, the same single-handle
//! discipline the combinators use.

use crate::sequence::Sequence;
use lace_core::{Error, Step, Value};
use tracing::trace;

impl Sequence {
    /// Close after a callback failure, keeping the callback's error.
    fn abort(&self) {
        if let Err(err) = self.close() {
            trace!(error = %err, "suppressed close error after callback failure");
        }
    }

    /// Fold the sequence with `reducer(accumulator, element, counter)`.
    ///
    /// Without a seed the first element becomes the accumulator and the
    /// counter starts at 1; an empty sequence without a seed is an error.
    pub fn reduce<F>(&self, mut reducer: F, seed: Option<Value>) -> Result<Value, Error>
    where
        F: FnMut(Value, Value, i64) -> Result<Value, Error>,
    {
        let mut counter: i64;
        let mut acc = match seed {
            Some(seed) => {
                counter = 0;
                seed
            }
            None => match self.next()? {
                Step::Done => return Err(Error::EmptyReduce),
                Step::Value(first) => {
                    counter = 1;
                    first
                }
            },
        };
        loop {
            match self.next()? {
                Step::Done => return Ok(acc),
                Step::Value(value) => {
                    let n = counter;
                    counter += 1;
                    acc = match reducer(acc, value, n) {
                        Ok(acc) => acc,
                        Err(err) => {
                            self.abort();
                            return Err(err);
                        }
                    };
                }
            }
        }
    }

    /// Drain into a vector
    pub fn to_values(&self) -> Result<Vec<Value>, Error> {
        let mut out = Vec::new();
        loop {
            match self.next()? {
                Step::Done => return Ok(out),
                Step::Value(value) => out.push(value),
            }
        }
    }

    /// Invoke `f(element, counter)` for every element
    pub fn for_each<F>(&self, mut f: F) -> Result<(), Error>
    where
        F: FnMut(Value, i64) -> Result<(), Error>,
    {
        let mut counter = 0i64;
        loop {
            match self.next()? {
                Step::Done => return Ok(()),
                Step::Value(value) => {
                    let n = counter;
                    counter += 1;
                    if let Err(err) = f(value, n) {
                        self.abort();
                        return Err(err);
                    }
                }
            }
        }
    }

    /// True if any element satisfies the predicate. Short-circuits without
    /// closing the sequence.
    pub fn some<F>(&self, mut predicate: F) -> Result<bool, Error>
    where
        F: FnMut(Value, i64) -> Result<Value, Error>,
    {
        let mut counter = 0i64;
        loop {
            match self.next()? {
                Step::Done => return Ok(false),
                Step::Value(value) => {
                    let n = counter;
                    counter += 1;
                    match predicate(value, n) {
                        Ok(verdict) => {
                            if verdict.is_truthy() {
                                return Ok(true);
                            }
                        }
                        Err(err) => {
                            self.abort();
                            return Err(err);
                        }
                    }
                }
            }
        }
    }

    /// True if every element satisfies the predicate. Short-circuits
    /// without closing the sequence.
    pub fn every<F>(&self, mut predicate: F) -> Result<bool, Error>
    where
        F: FnMut(Value, i64) -> Result<Value, Error>,
    {
        let mut counter = 0i64;
        loop {
            match self.next()? {
                Step::Done => return Ok(true),
                Step::Value(value) => {
                    let n = counter;
                    counter += 1;
                    match predicate(value, n) {
                        Ok(verdict) => {
                            if !verdict.is_truthy() {
                                return Ok(false);
                            }
                        }
                        Err(err) => {
                            self.abort();
                            return Err(err);
                        }
                    }
                }
            }
        }
    }

    /// First element satisfying the predicate, if any. Short-circuits
    /// without closing the sequence.
    pub fn find<F>(&self, mut predicate: F) -> Result<Option<Value>, Error>
    where
        F: FnMut(Value, i64) -> Result<Value, Error>,
    {
        let mut counter = 0i64;
        loop {
            match self.next()? {
                Step::Done => return Ok(None),
                Step::Value(value) => {
                    let n = counter;
                    counter += 1;
                    match predicate(value.clone(), n) {
                        Ok(verdict) => {
                            if verdict.is_truthy() {
                                return Ok(Some(value));
                            }
                        }
                        Err(err) => {
                            self.abort();
                            return Err(err);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{events, int_list, new_log, ProbeSource};

    fn is_even(v: Value, _: i64) -> Result<Value, Error> {
        match v {
            Value::Int(n) => Ok(Value::Bool(n % 2 == 0)),
            _ => Ok(Value::Bool(false)),
        }
    }

    #[test]
    fn test_reduce_with_seed() {
        let seq = Sequence::from_value(&int_list(&[1, 2, 3])).unwrap();
        let sum = seq
            .reduce(
                |acc, v, _| match (acc, v) {
                    (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
                    _ => Err(Error::custom("not ints")),
                },
                Some(Value::Int(10)),
            )
            .unwrap();
        assert_eq!(sum, Value::Int(16));
    }

    #[test]
    fn test_reduce_without_seed_starts_counter_at_one() {
        let seq = Sequence::from_value(&int_list(&[5, 6, 7])).unwrap();
        let counters = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let counters_in = counters.clone();
        let first = seq
            .reduce(
                move |acc, _, n| {
                    counters_in.borrow_mut().push(n);
                    Ok(acc)
                },
                None,
            )
            .unwrap();
        assert_eq!(first, Value::Int(5));
        assert_eq!(*counters.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_reduce_empty_without_seed_is_an_error() {
        let seq = Sequence::from_value(&int_list(&[])).unwrap();
        assert_eq!(seq.reduce(|acc, _, _| Ok(acc), None), Err(Error::EmptyReduce));
    }

    #[test]
    fn test_to_values_drains() {
        let seq = Sequence::from_value(&int_list(&[1, 2])).unwrap();
        assert_eq!(
            seq.to_values().unwrap(),
            vec![Value::Int(1), Value::Int(2)]
        );
        // The sequence is exhausted afterwards
        assert_eq!(seq.to_values().unwrap(), Vec::<Value>::new());
    }

    #[test]
    fn test_for_each_counts_from_zero() {
        let seq = Sequence::from_value(&int_list(&[7, 8])).unwrap();
        let mut seen = Vec::new();
        seq.for_each(|v, n| {
            seen.push((v, n));
            Ok(())
        })
        .unwrap();
        assert_eq!(
            seen,
            vec![(Value::Int(7), 0), (Value::Int(8), 1)]
        );
    }

    #[test]
    fn test_short_circuit_does_not_close() {
        let log = new_log();
        let source =
            ProbeSource::new("a", vec![Value::Int(1), Value::Int(2), Value::Int(3)], &log)
                .into_value();
        let seq = Sequence::from_value(&source).unwrap();
        assert_eq!(seq.some(is_even), Ok(true));
        // Stopped after pulling 2, no close issued
        assert_eq!(events(&log), vec!["a.pull", "a.pull"]);

        let log = new_log();
        let source =
            ProbeSource::new("a", vec![Value::Int(2), Value::Int(1), Value::Int(4)], &log)
                .into_value();
        let seq = Sequence::from_value(&source).unwrap();
        assert_eq!(seq.every(is_even), Ok(false));
        assert_eq!(events(&log), vec!["a.pull", "a.pull"]);

        let log = new_log();
        let source =
            ProbeSource::new("a", vec![Value::Int(1), Value::Int(4), Value::Int(5)], &log)
                .into_value();
        let seq = Sequence::from_value(&source).unwrap();
        assert_eq!(seq.find(is_even), Ok(Some(Value::Int(4))));
        assert_eq!(events(&log), vec!["a.pull", "a.pull"]);
    }

    #[test]
    fn test_exhaustion_answers() {
        let seq = Sequence::from_value(&int_list(&[1, 3])).unwrap();
        assert_eq!(seq.some(is_even), Ok(false));
        let seq = Sequence::from_value(&int_list(&[2, 4])).unwrap();
        assert_eq!(seq.every(is_even), Ok(true));
        let seq = Sequence::from_value(&int_list(&[1, 3])).unwrap();
        assert_eq!(seq.find(is_even), Ok(None));
    }

    #[test]
    fn test_callback_error_closes_the_sequence() {
        let log = new_log();
        let source =
            ProbeSource::new("a", vec![Value::Int(1), Value::Int(2)], &log).into_value();
        let seq = Sequence::from_value(&source).unwrap();
        let result = seq.for_each(|_, _| Err(Error::custom("visitor failed")));
        assert_eq!(result, Err(Error::custom("visitor failed")));
        assert_eq!(events(&log), vec!["a.pull", "a.close"]);
    }

    #[test]
    fn test_pull_error_propagates_without_close() {
        let log = new_log();
        let source = ProbeSource::new("a", vec![Value::Int(1)], &log)
            .fail_pull_at(0)
            .into_value();
        let seq = Sequence::from_value(&source).unwrap();
        assert_eq!(
            seq.to_values(),
            Err(Error::custom("a pull failure"))
        );
        assert_eq!(events(&log), vec!["a.pull"]);
    }
}
