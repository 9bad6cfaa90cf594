//! End-to-end round trips through a default registry.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use indexmap::IndexMap;
use num_bigint::BigInt;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque};
use std::fmt::Debug;
use textform::{KeyValue, Shaped, TransformerRegistry};

fn assert_round_trip<T>(value: T)
where
    T: Shaped + PartialEq + Debug + 'static,
{
    let registry = TransformerRegistry::new();
    let rendered = registry.format(&value).unwrap();
    let parsed: T = registry.parse(&rendered).unwrap();
    assert_eq!(parsed, value, "rendered text was '{rendered}'");
}

#[test]
fn primitive_round_trips() {
    assert_round_trip(0i32);
    assert_round_trip(-42i32);
    assert_round_trip(i64::MIN);
    assert_round_trip(u8::MAX);
    assert_round_trip(u128::MAX);
    assert_round_trip(3.25f64);
    assert_round_trip(f64::MIN_POSITIVE);
    assert_round_trip(true);
    assert_round_trip('x');
    assert_round_trip('|');
    assert_round_trip('∅');
}

#[test]
fn top_level_strings_are_verbatim() {
    // no composite grammar is active at the top level, so nothing escapes
    assert_round_trip(String::new());
    assert_round_trip("plain".to_string());
    assert_round_trip(r"a|b;c=d(e,f)\g".to_string());
}

#[test]
fn optional_round_trips() {
    assert_round_trip(Some(17i32));
    assert_round_trip(None::<i32>);
    assert_round_trip(Some("text".to_string()));
    assert_round_trip(None::<String>);
}

#[test]
fn tuple_round_trips() {
    assert_round_trip((1i32,));
    assert_round_trip((-7i32, "Wrocław".to_string()));
    assert_round_trip((1u8, Some(2i32), "a,b".to_string()));
    assert_round_trip((None::<i32>, 5i64));
    assert_round_trip((1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13));
}

#[test]
fn collection_round_trips() {
    assert_round_trip(vec![1i32, 2, 3]);
    assert_round_trip(Vec::<i32>::new());
    assert_round_trip(vec!["a".to_string(), "b|c".to_string(), "∅?".to_string()]);
    assert_round_trip(VecDeque::from([1i16, 2, 3]));
    assert_round_trip(LinkedList::from(["x".to_string(), "y".to_string()]));
    assert_round_trip(HashSet::from([1u32, 2, 3]));
    assert_round_trip(BTreeSet::from(["a".to_string(), "b".to_string()]));
}

#[test]
fn sequence_of_optionals_keeps_null_slots() {
    let registry = TransformerRegistry::new();
    let values = vec![Some("B".to_string()), None, Some("A".to_string()), None];
    let rendered = registry.format(&values).unwrap();
    assert_eq!(rendered, "B|∅|A|∅");
    assert_eq!(registry.parse::<Vec<Option<String>>>(&rendered).unwrap(), values);
}

#[test]
fn array_round_trips() {
    assert_round_trip([1i32, 2, 3, 4]);
    assert_round_trip(["a|b".to_string(), "c".to_string()]);
    assert_round_trip([0u8; 0]);
    assert_round_trip([Some(1i32), None]);
}

#[test]
fn map_round_trips() {
    assert_round_trip(HashMap::from([
        ("one".to_string(), 1i32),
        ("two".to_string(), 2),
    ]));
    assert_round_trip(BTreeMap::from([
        ("k;ey".to_string(), "v=alue".to_string()),
        ("".to_string(), "".to_string()),
    ]));

    let mut indexed = IndexMap::new();
    indexed.insert("zebra".to_string(), 1i32);
    indexed.insert("aardvark".to_string(), 2);
    assert_round_trip(indexed);
}

#[test]
fn key_value_round_trips() {
    assert_round_trip(KeyValue::new("city".to_string(), 42i32));
    assert_round_trip(KeyValue::new("a=b".to_string(), Some("c;d".to_string())));
    assert_round_trip(KeyValue::new("missing".to_string(), None::<i32>));
}

#[test]
fn nested_composites_round_trip() {
    let mut value: IndexMap<String, Vec<(i32, String)>> = IndexMap::new();
    value.insert(
        "first".to_string(),
        vec![(1, "a|b".to_string()), (2, "c,d".to_string())],
    );
    value.insert("empty".to_string(), Vec::new());
    assert_round_trip(value);

    assert_round_trip(vec![vec![1i32, 2], vec![], vec![3]]);
    assert_round_trip(Some((1i32, vec!["x".to_string(), "y∅z".to_string()])));
}

#[test]
fn chrono_round_trips() {
    assert_round_trip(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    assert_round_trip(NaiveTime::from_hms_milli_opt(23, 59, 59, 250).unwrap());
    assert_round_trip(
        NaiveDateTime::new(
            NaiveDate::from_ymd_opt(1999, 12, 31).unwrap(),
            NaiveTime::from_hms_opt(12, 0, 1).unwrap(),
        ),
    );
    assert_round_trip(Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap());
    assert_round_trip(vec![
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2021, 6, 15).unwrap(),
    ]);
}

#[test]
fn bigint_round_trips() {
    let huge: BigInt = "123456789012345678901234567890".parse().unwrap();
    assert_round_trip(huge.clone());
    assert_round_trip(vec![huge, BigInt::from(-1)]);
}

#[test]
fn convenience_functions_share_the_default_grammar() {
    let point: (i32, i32) = textform::from_text("(3,-4)").unwrap();
    assert_eq!(point, (3, -4));
    assert_eq!(textform::to_text(&point).unwrap(), "(3,-4)");
}
