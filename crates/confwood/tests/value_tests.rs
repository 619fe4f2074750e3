//! Values, operators and containers

use std::sync::Arc;

use confwood::*;
use pretty_assertions::assert_eq;

// ═══════════════════════════════════════════════════════════════════════
// Conversions
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_type_names() {
    assert_eq!(Value::Empty.type_name(), "Empty");
    assert_eq!(Value::from(true).type_name(), "Boolean");
    assert_eq!(Value::from(1.5).type_name(), "Number");
    assert_eq!(Value::from("x").type_name(), "String");
    assert_eq!(Value::array(vec![]).type_name(), "Array");
    assert_eq!(Value::dictionary().type_name(), "Dictionary");
}

#[test]
fn test_number_conversion() {
    assert_eq!(Value::Empty.to_number().unwrap(), 0.0);
    assert_eq!(Value::from(true).to_number().unwrap(), 1.0);
    assert_eq!(Value::from("2.5").to_number().unwrap(), 2.5);
    assert!(Value::from("web1").to_number().is_err());
    assert!(Value::dictionary().to_number().is_err());
}

#[test]
fn test_display() {
    assert_eq!(Value::Empty.to_string(), "");
    assert_eq!(Value::from(3).to_string(), "3");
    assert_eq!(Value::from(0.25).to_string(), "0.25");
    assert_eq!(
        Value::array(vec![Value::from(1), Value::from("a")]).to_string(),
        r#"[1,"a"]"#
    );
}

#[test]
fn test_json_round_trip_keeps_key_order() {
    let value = Value::from_json_str(r#"{"z": 1, "a": [true, null]}"#).unwrap();
    let dict = value.as_dictionary().unwrap();
    assert_eq!(dict.keys(), vec!["z", "a"]);
    assert_eq!(value.to_json_string().unwrap(), r#"{"z":1,"a":[true,null]}"#);
}

// ═══════════════════════════════════════════════════════════════════════
// Operators
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_empty_acts_as_zero_or_empty_string() {
    assert_eq!(Value::Empty.plus(&Value::from(2)).unwrap(), Value::from(2));
    assert_eq!(Value::from("a").plus(&Value::Empty).unwrap(), Value::from("a"));
    assert!(Value::Empty.plus(&Value::Empty).is_err());
}

#[test]
fn test_plus_merges_containers_into_fresh_ones() {
    let left = Value::dictionary_from([("a", Value::from(1)), ("b", Value::from(2))]);
    let right = Value::dictionary_from([("b", Value::from(3))]);
    let merged = left.plus(&right).unwrap();

    let dict = merged.as_dictionary().unwrap();
    assert_eq!(dict.get("b"), Some(Value::from(3)));
    assert!(!merged.is_same_object(&left));
    assert_eq!(left.as_dictionary().unwrap().get("b"), Some(Value::from(2)));
}

#[test]
fn test_array_difference() {
    let left = Value::array(vec![Value::from(1), Value::from(2), Value::from(3)]);
    let right = Value::array(vec![Value::from(2)]);
    assert_eq!(
        left.minus(&right).unwrap().as_array().unwrap().to_vec(),
        vec![Value::from(1), Value::from(3)]
    );
}

#[test]
fn test_mismatched_operands() {
    let err = Value::from(true).times(&Value::from("x")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Operator * cannot be applied to values of type 'Boolean' and 'String'"
    );
}

#[test]
fn test_comparisons() {
    assert!(Value::from(1).less_than(&Value::from(2)).unwrap());
    assert!(Value::from("b").greater_than(&Value::from("a")).unwrap());
    // different types order by type name
    assert!(Value::from(1).less_than(&Value::from("x")).is_ok());
    assert!(Value::dictionary().less_than(&Value::dictionary()).is_err());
}

#[test]
fn test_equality() {
    assert_eq!(Value::Empty, Value::from(0));
    assert_eq!(Value::from(true), Value::from(1));
    assert_ne!(Value::from("1"), Value::from(1));
    assert_eq!(
        Value::array(vec![Value::from(1)]),
        Value::array(vec![Value::from(1)])
    );
    // dictionaries compare by identity
    assert_ne!(Value::dictionary(), Value::dictionary());
}

// ═══════════════════════════════════════════════════════════════════════
// Containers
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_array_operations() {
    let array = Array::new();
    array.add(Value::from("a")).unwrap();
    array.add(Value::from("c")).unwrap();
    array.insert(1, Value::from("b")).unwrap();
    assert_eq!(array.len(), 3);
    assert_eq!(array.get(1).unwrap(), Value::from("b"));

    assert_eq!(array.remove(0).unwrap(), Value::from("a"));
    assert!(matches!(
        array.get(5),
        Err(ContainerError::IndexOutOfRange { index: 5, len: 2 })
    ));
}

#[test]
fn test_frozen_containers_reject_writes() {
    let dict = Dictionary::new();
    dict.set("a", Value::from(1)).unwrap();
    dict.freeze();
    assert_eq!(
        dict.set("a", Value::from(2)),
        Err(ContainerError::Frozen { kind: "Dictionary" })
    );
    assert_eq!(dict.get("a"), Some(Value::from(1)));

    let array = Array::new();
    array.freeze();
    assert_eq!(
        array.add(Value::Empty).unwrap_err().to_string(),
        "Array must not be modified after it was frozen"
    );
}

#[test]
fn test_shallow_clone_shares_nested_values() {
    let nested = Value::dictionary();
    let dict = Dictionary::new();
    dict.set("vars", nested.clone()).unwrap();

    let copy = dict.shallow_clone();
    copy.set("extra", Value::from(1)).unwrap();

    assert!(!dict.contains("extra"));
    assert!(copy.get("vars").unwrap().is_same_object(&nested));
}

#[test]
fn test_iteration_under_lock() {
    let dict: Dictionary = [("a", Value::from(1)), ("b", Value::from(2))]
        .into_iter()
        .collect();
    let lock = ObjectLock::new(&dict);
    let keys: Vec<_> = dict.iter(&lock).map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["a", "b"]);

    let array = Arc::new(Array::from_vec(vec![Value::from(1), Value::from(2)]));
    let lock = ObjectLock::new(array.as_ref());
    let sum: f64 = array
        .iter(&lock)
        .map(|(_, v)| v.as_number().unwrap_or_default())
        .sum();
    assert_eq!(sum, 3.0);
}
