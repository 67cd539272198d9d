//! End-to-end tests of joint iteration and the closing discipline
//!
//! These exercise the public Sequence API the way a host program would:
//! composing combinators, joining groups of sources, and checking that
//! every underlying source sees exactly the pulls and closes it should.

use lace_core::{Error, Record, Step, Value};
use lace_runtime::probe::{events, int_list, new_log, str_list, ProbeSource};
use lace_runtime::Sequence;

fn options(pairs: Vec<(&str, Value)>) -> Value {
    Value::record(Record::from_pairs(pairs))
}

#[test]
fn test_shortest_zip_closes_only_the_survivor() {
    let log = new_log();
    let a = ProbeSource::new(
        "a",
        vec![Value::Int(1), Value::Int(2), Value::Int(3)],
        &log,
    )
    .into_value();
    let b = ProbeSource::new("b", vec![Value::str("x"), Value::str("y")], &log).into_value();

    let seq = Sequence::zip(&Value::list(vec![a, b]), &Value::Undefined).unwrap();
    assert_eq!(
        seq.to_values().unwrap(),
        vec![
            Value::list(vec![Value::Int(1), Value::str("x")]),
            Value::list(vec![Value::Int(2), Value::str("y")]),
        ]
    );
    // b exhausted naturally and is never closed; a is closed exactly once,
    // when b's exhaustion is discovered
    let all = events(&log);
    assert_eq!(all.iter().filter(|e| *e == "a.close").count(), 1);
    assert_eq!(all.iter().filter(|e| *e == "b.close").count(), 0);

    // Completed is terminal with no further source access
    let before = events(&log).len();
    assert_eq!(seq.next(), Ok(Step::Done));
    assert_eq!(events(&log).len(), before);
}

#[test]
fn test_strict_zip_full_drain_and_mismatch() {
    let inputs = Value::list(vec![int_list(&[1, 2]), int_list(&[3, 4])]);
    let seq = Sequence::zip(&inputs, &options(vec![("mode", Value::str("strict"))])).unwrap();
    assert_eq!(seq.to_values().unwrap().len(), 2);

    let inputs = Value::list(vec![int_list(&[1]), int_list(&[1, 2])]);
    let seq = Sequence::zip(&inputs, &options(vec![("mode", Value::str("strict"))])).unwrap();
    assert!(matches!(seq.next(), Ok(Step::Value(_))));
    assert_eq!(seq.next(), Err(Error::LengthMismatch));
    // The failure is terminal
    assert_eq!(seq.next(), Ok(Step::Done));
}

#[test]
fn test_zip_keyed_longest_with_padding_record() {
    let inputs = Value::record(Record::from_pairs(vec![
        ("a", int_list(&[1, 2])),
        ("b", str_list(&["x"])),
    ]));
    let opts = options(vec![
        ("mode", Value::str("longest")),
        (
            "padding",
            Value::record(Record::from_pairs(vec![
                ("a", Value::Int(0)),
                ("b", Value::Int(0)),
            ])),
        ),
    ]);
    let seq = Sequence::zip_keyed(&inputs, &opts).unwrap();
    let rows = seq.to_values().unwrap();
    assert_eq!(
        rows,
        vec![
            Value::record(Record::from_pairs(vec![
                ("a", Value::Int(1)),
                ("b", Value::str("x")),
            ])),
            Value::record(Record::from_pairs(vec![
                ("a", Value::Int(2)),
                ("b", Value::Int(0)),
            ])),
        ]
    );
}

#[test]
fn test_take_zero_closes_without_pulling() {
    let log = new_log();
    let source = ProbeSource::new("a", vec![Value::Int(1)], &log).into_value();
    let seq = Sequence::from_value(&source)
        .unwrap()
        .take(&Value::Int(0))
        .unwrap();
    assert_eq!(seq.next(), Ok(Step::Done));
    assert_eq!(events(&log), vec!["a.close"]);
}

#[test]
fn test_take_closes_exactly_once_either_way() {
    // Limit reached first
    let log = new_log();
    let source =
        ProbeSource::new("a", vec![Value::Int(1), Value::Int(2), Value::Int(3)], &log)
            .into_value();
    let seq = Sequence::from_value(&source)
        .unwrap()
        .take(&Value::Int(2))
        .unwrap();
    assert_eq!(seq.to_values().unwrap(), vec![Value::Int(1), Value::Int(2)]);
    assert_eq!(
        events(&log)
            .iter()
            .filter(|e| *e == "a.close")
            .count(),
        1
    );

    // Source exhausts first: natural exhaustion, no close at all
    let log = new_log();
    let source = ProbeSource::new("a", vec![Value::Int(1)], &log).into_value();
    let seq = Sequence::from_value(&source)
        .unwrap()
        .take(&Value::Int(9))
        .unwrap();
    assert_eq!(seq.to_values().unwrap(), vec![Value::Int(1)]);
    assert_eq!(
        events(&log)
            .iter()
            .filter(|e| *e == "a.close")
            .count(),
        0
    );
}

#[test]
fn test_from_round_trip_preserves_identity() {
    let seq = Sequence::from_value(&int_list(&[1, 2, 3])).unwrap();
    let round_tripped = Sequence::from_value(&seq.to_value()).unwrap();
    assert!(seq.ptr_eq(&round_tripped));
    // Both handles drive the same underlying state
    assert_eq!(seq.next(), Ok(Step::Value(Value::Int(1))));
    assert_eq!(round_tripped.next(), Ok(Step::Value(Value::Int(2))));
}

#[test]
fn test_options_validation_order_is_observable() {
    // Invalid first argument: the bogus options are never inspected
    let bogus_options = options(vec![("mode", Value::str("sideways"))]);
    let err = Sequence::zip(&Value::Int(1), &bogus_options).unwrap_err();
    assert_eq!(
        err,
        Error::type_err("zip requires an object of iterables, got Int")
    );

    // Valid first argument: mode is read and rejected
    let err = Sequence::zip(&Value::list(vec![]), &bogus_options).unwrap_err();
    assert_eq!(err, Error::type_err("invalid mode: \"sideways\""));

    // Padding is only consulted in longest mode
    let shortest_with_bad_padding = options(vec![
        ("mode", Value::str("shortest")),
        ("padding", Value::Bool(true)),
    ]);
    assert!(Sequence::zip(&Value::list(vec![]), &shortest_with_bad_padding).is_ok());
}

#[test]
fn test_chain_of_combinators_over_a_join() {
    // zip feeds map feeds filter, with everything lazy until the drain
    let inputs = Value::list(vec![int_list(&[1, 2, 3, 4]), int_list(&[10, 20, 30, 40])]);
    let pairs = Sequence::zip(&inputs, &Value::Undefined).unwrap();
    let sums = pairs.map(Box::new(|row, _| match row {
        Value::List(items) => match (&items[0], &items[1]) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
            _ => Err(Error::custom("expected int pair")),
        },
        other => Err(Error::custom(format!("expected row, got {:?}", other))),
    }));
    let big = sums.filter(Box::new(|v, _| match v {
        Value::Int(n) => Ok(Value::Bool(n > 20)),
        _ => Ok(Value::Bool(false)),
    }));
    assert_eq!(
        big.to_values().unwrap(),
        vec![Value::Int(33), Value::Int(44)]
    );
}

#[test]
fn test_flat_map_and_concat_share_the_flattening_rules() {
    let seq = Sequence::from_value(&int_list(&[1, 2]))
        .unwrap()
        .flat_map(Box::new(|v, _| match v {
            Value::Int(n) => Ok(int_list(&[n, -n])),
            other => Ok(other),
        }));
    assert_eq!(
        seq.to_values().unwrap(),
        vec![Value::Int(1), Value::Int(-1), Value::Int(2), Value::Int(-2)]
    );

    let seq = Sequence::concat(vec![int_list(&[1]), int_list(&[2, 3])]).unwrap();
    assert_eq!(
        seq.to_values().unwrap(),
        vec![Value::Int(1), Value::Int(2), Value::Int(3)]
    );
}

#[test]
fn test_reduce_drives_a_joined_sequence() {
    let inputs = Value::list(vec![int_list(&[1, 2, 3]), int_list(&[4, 5, 6])]);
    let seq = Sequence::zip(&inputs, &Value::Undefined).unwrap();
    let total = seq
        .reduce(
            |acc, row, _| match (acc, row) {
                (Value::Int(sum), Value::List(items)) => {
                    let mut sum = sum;
                    for item in items.iter() {
                        if let Value::Int(n) = item {
                            sum += n;
                        }
                    }
                    Ok(Value::Int(sum))
                }
                _ => Err(Error::custom("bad shapes")),
            },
            Some(Value::Int(0)),
        )
        .unwrap();
    assert_eq!(total, Value::Int(21));
}
