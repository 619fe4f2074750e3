//! Methods available on built-in value kinds
//!
//! `arr.len()`, `dict.keys()`, `"a,b".split(",")`: the indexer resolves the
//! name through these tables when the value has no entry of its own, and the
//! call binds `this` to the receiver.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use super::ScriptFrame;
use crate::container::{Array, Dictionary};
use crate::error::{ContainerError, EvalError};
use crate::value::{Function, Value};

type MethodTable = HashMap<String, Arc<Function>>;

/// Resolve `name` on the prototype of `value`'s kind.
pub(crate) fn lookup_method(value: &Value, name: &str) -> Option<Arc<Function>> {
    let table = match value {
        Value::Array(_) => array_prototype(),
        Value::Dictionary(_) => dictionary_prototype(),
        Value::String(_) => string_prototype(),
        _ => return None,
    };
    table.get(name).cloned()
}

fn table(methods: Vec<Function>) -> MethodTable {
    methods
        .into_iter()
        .map(|method| (method.name.clone(), Arc::new(method)))
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════
// Receiver helpers
// ═══════════════════════════════════════════════════════════════════════

fn this_array<'v>(this: &'v Value, method: &str) -> Result<&'v Arc<Array>, EvalError> {
    this.as_array().ok_or_else(|| bad_receiver("Array", method, this))
}

fn this_dictionary<'v>(this: &'v Value, method: &str) -> Result<&'v Arc<Dictionary>, EvalError> {
    this.as_dictionary()
        .ok_or_else(|| bad_receiver("Dictionary", method, this))
}

fn this_str<'v>(this: &'v Value, method: &str) -> Result<&'v str, EvalError> {
    this.as_str().ok_or_else(|| bad_receiver("String", method, this))
}

fn bad_receiver(expected: &str, method: &str, this: &Value) -> EvalError {
    EvalError::type_mismatch(format!(
        "{expected}#{method} called on a value of type '{}'",
        this.type_name()
    ))
}

fn key_arg(value: &Value) -> String {
    match value {
        Value::String(s) => s.as_str().to_string(),
        other => other.to_string(),
    }
}

/// Convert a script index into a position inside `array`.
pub(crate) fn array_index(array: &Array, index: &Value) -> Result<usize, EvalError> {
    let n = index.to_number()?;
    let len = array.len();
    if n < 0.0 || n.fract() != 0.0 || n >= len as f64 {
        return Err(ContainerError::IndexOutOfRange {
            index: n as i64,
            len,
        }
        .into());
    }
    Ok(n as usize)
}

// ═══════════════════════════════════════════════════════════════════════
// Array
// ═══════════════════════════════════════════════════════════════════════

fn array_prototype() -> &'static MethodTable {
    static TABLE: OnceLock<MethodTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        table(vec![
            Function::native("len", 0, |_, this, _| {
                Ok(Value::from(this_array(this, "len")?.len()))
            })
            .side_effect_free(),
            Function::native("add", 1, |_, this, args| {
                this_array(this, "add")?.add(args[0].clone())?;
                Ok(Value::Empty)
            }),
            Function::native("remove", 1, |_, this, args| {
                let array = this_array(this, "remove")?;
                let index = array_index(array, &args[0])?;
                array.remove(index)?;
                Ok(Value::Empty)
            }),
            Function::native("contains", 1, |_, this, args| {
                Ok(Value::from(this_array(this, "contains")?.contains(&args[0])))
            })
            .side_effect_free(),
            Function::native("get", 1, |_, this, args| {
                let array = this_array(this, "get")?;
                let index = array_index(array, &args[0])?;
                Ok(array.get(index)?)
            })
            .side_effect_free(),
            Function::native("set", 2, |_, this, args| {
                let array = this_array(this, "set")?;
                let index = array_index(array, &args[0])?;
                array.set(index, args[1].clone())?;
                Ok(Value::Empty)
            }),
            Function::native("clear", 0, |_, this, _| {
                this_array(this, "clear")?.clear()?;
                Ok(Value::Empty)
            }),
            Function::native("join", 0, |_, this, args| {
                let separator = args.first().map(key_arg).unwrap_or_default();
                let parts: Vec<String> = this_array(this, "join")?
                    .to_vec()
                    .iter()
                    .map(key_arg)
                    .collect();
                Ok(Value::string(parts.join(&separator)))
            })
            .side_effect_free(),
            Function::native("sort", 0, array_sort).side_effect_free(),
            Function::native("reverse", 0, |_, this, _| {
                let mut items = this_array(this, "reverse")?.to_vec();
                items.reverse();
                Ok(Value::array(items))
            })
            .side_effect_free(),
            Function::native("shallow_clone", 0, |_, this, _| {
                Ok(Value::from(this_array(this, "shallow_clone")?.shallow_clone()))
            })
            .side_effect_free(),
            Function::native("freeze", 0, |_, this, _| {
                this_array(this, "freeze")?.freeze();
                Ok(Value::Empty)
            }),
        ])
    })
}

/// Sorted copy of the receiver, optionally ordered by a `less(a, b)`
/// callback.
///
/// The merge only ever asks "is b before a", so a callback that answers
/// inconsistently yields some permutation of the input rather than a
/// panic.
fn array_sort(frame: &mut ScriptFrame<'_>, this: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let items = this_array(this, "sort")?.to_vec();

    let sorted = match args.first() {
        None | Some(Value::Empty) => {
            merge_sort(items, &mut |a, b| Ok(a.try_cmp(b)? == Ordering::Less))?
        }
        Some(Value::Function(less)) => {
            let less = Arc::clone(less);
            let frame = &*frame;
            merge_sort(items, &mut |a, b| {
                let args = [a.clone(), b.clone()];
                Ok(crate::eval::invoke(&less, frame, Value::Empty, &args)?.to_bool())
            })?
        }
        Some(other) => {
            return Err(EvalError::type_mismatch(format!(
                "Array#sort expects a Function, got '{}'",
                other.type_name()
            )))
        }
    };

    Ok(Value::array(sorted))
}

/// Stable top-down merge sort that stops at the first comparison error.
fn merge_sort<F>(mut items: Vec<Value>, less: &mut F) -> Result<Vec<Value>, EvalError>
where
    F: FnMut(&Value, &Value) -> Result<bool, EvalError>,
{
    if items.len() <= 1 {
        return Ok(items);
    }

    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, less)?;
    let right = merge_sort(right, less)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
        let next = if less(r, l)? { right.next() } else { left.next() };
        merged.extend(next);
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

// ═══════════════════════════════════════════════════════════════════════
// Dictionary
// ═══════════════════════════════════════════════════════════════════════

fn dictionary_prototype() -> &'static MethodTable {
    static TABLE: OnceLock<MethodTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        table(vec![
            Function::native("len", 0, |_, this, _| {
                Ok(Value::from(this_dictionary(this, "len")?.len()))
            })
            .side_effect_free(),
            Function::native("get", 1, |_, this, args| {
                let dict = this_dictionary(this, "get")?;
                Ok(dict.get(&key_arg(&args[0])).unwrap_or_default())
            })
            .side_effect_free(),
            Function::native("set", 2, |_, this, args| {
                this_dictionary(this, "set")?.set(key_arg(&args[0]), args[1].clone())?;
                Ok(Value::Empty)
            }),
            Function::native("remove", 1, |_, this, args| {
                this_dictionary(this, "remove")?.remove(&key_arg(&args[0]))?;
                Ok(Value::Empty)
            }),
            Function::native("contains", 1, |_, this, args| {
                let dict = this_dictionary(this, "contains")?;
                Ok(Value::from(dict.contains(&key_arg(&args[0]))))
            })
            .side_effect_free(),
            Function::native("keys", 0, |_, this, _| {
                let keys = this_dictionary(this, "keys")?.keys();
                Ok(Value::array(keys.into_iter().map(Value::from).collect()))
            })
            .side_effect_free(),
            Function::native("values", 0, |_, this, _| {
                Ok(Value::array(this_dictionary(this, "values")?.values()))
            })
            .side_effect_free(),
            Function::native("shallow_clone", 0, |_, this, _| {
                Ok(Value::from(this_dictionary(this, "shallow_clone")?.shallow_clone()))
            })
            .side_effect_free(),
            Function::native("freeze", 0, |_, this, _| {
                this_dictionary(this, "freeze")?.freeze();
                Ok(Value::Empty)
            }),
        ])
    })
}

// ═══════════════════════════════════════════════════════════════════════
// String
// ═══════════════════════════════════════════════════════════════════════

fn string_prototype() -> &'static MethodTable {
    static TABLE: OnceLock<MethodTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        table(vec![
            Function::native("len", 0, |_, this, _| {
                Ok(Value::from(this_str(this, "len")?.chars().count()))
            })
            .side_effect_free(),
            Function::native("contains", 1, |_, this, args| {
                let needle = key_arg(&args[0]);
                Ok(Value::from(this_str(this, "contains")?.contains(needle.as_str())))
            })
            .side_effect_free(),
            Function::native("upper", 0, |_, this, _| {
                Ok(Value::string(this_str(this, "upper")?.to_uppercase()))
            })
            .side_effect_free(),
            Function::native("lower", 0, |_, this, _| {
                Ok(Value::string(this_str(this, "lower")?.to_lowercase()))
            })
            .side_effect_free(),
            Function::native("split", 1, |_, this, args| {
                let separator = key_arg(&args[0]);
                let s = this_str(this, "split")?;
                let parts: Vec<Value> = if separator.is_empty() {
                    s.chars().map(|c| Value::string(c.to_string())).collect()
                } else {
                    s.split(separator.as_str()).map(Value::from).collect()
                };
                Ok(Value::array(parts))
            })
            .side_effect_free(),
            Function::native("trim", 0, |_, this, _| {
                Ok(Value::string(this_str(this, "trim")?.trim()))
            })
            .side_effect_free(),
            Function::native("substr", 1, string_substr).side_effect_free(),
        ])
    })
}

/// `s.substr(start[, len])`, counted in characters.
fn string_substr(_: &mut ScriptFrame<'_>, this: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let s = this_str(this, "substr")?;
    let total = s.chars().count();

    let start = args[0].to_number()?;
    if start < 0.0 || start > total as f64 {
        return Err(EvalError::type_mismatch(format!(
            "String#substr start {start} is out of range for a string of length {total}"
        )));
    }
    let start = start as usize;

    let count = match args.get(1) {
        Some(len) => {
            let len = len.to_number()?;
            if len < 0.0 {
                return Err(EvalError::type_mismatch("String#substr length must not be negative"));
            }
            len as usize
        }
        None => total - start,
    };

    Ok(Value::string(s.chars().skip(start).take(count).collect::<String>()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FunctionBody;
    use crate::EvalContext;

    fn call(this: &Value, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        let ctx = EvalContext::new();
        let mut frame = ScriptFrame::new(&ctx);
        let method = lookup_method(this, name).unwrap();
        let FunctionBody::Native(f) = &method.body else {
            unreachable!()
        };
        f(&mut frame, this, args)
    }

    fn numbers(ns: &[i32]) -> Value {
        Value::array(ns.iter().map(|n| Value::from(*n)).collect())
    }

    #[test]
    fn test_lookup_by_kind() {
        assert!(lookup_method(&numbers(&[]), "join").is_some());
        assert!(lookup_method(&Value::dictionary(), "keys").is_some());
        assert!(lookup_method(&Value::from("x"), "upper").is_some());
        assert!(lookup_method(&Value::from(1), "len").is_none());
        assert!(lookup_method(&Value::from("x"), "nope").is_none());
    }

    #[test]
    fn test_mutators_are_not_side_effect_free() {
        let arr = numbers(&[]);
        assert!(!lookup_method(&arr, "add").unwrap().side_effect_free);
        assert!(!lookup_method(&arr, "freeze").unwrap().side_effect_free);
        assert!(lookup_method(&arr, "sort").unwrap().side_effect_free);
        let dict = Value::dictionary();
        assert!(!lookup_method(&dict, "set").unwrap().side_effect_free);
        assert!(lookup_method(&dict, "get").unwrap().side_effect_free);
    }

    #[test]
    fn test_array_methods() {
        let arr = numbers(&[3, 1, 2]);
        call(&arr, "add", &[Value::from(0)]).unwrap();
        assert_eq!(call(&arr, "len", &[]).unwrap(), Value::from(4));
        assert_eq!(call(&arr, "sort", &[]).unwrap(), numbers(&[0, 1, 2, 3]));
        // sort returns a copy
        assert_eq!(arr, numbers(&[3, 1, 2, 0]));
        assert_eq!(call(&arr, "join", &[Value::from("-")]).unwrap(), Value::from("3-1-2-0"));
        assert_eq!(call(&arr, "get", &[Value::from(1)]).unwrap(), Value::from(1));
        assert!(call(&arr, "get", &[Value::from(9)]).is_err());
        call(&arr, "remove", &[Value::from(0)]).unwrap();
        assert_eq!(arr, numbers(&[1, 2, 0]));
        assert_eq!(call(&arr, "reverse", &[]).unwrap(), numbers(&[0, 2, 1]));
    }

    #[test]
    fn test_sort_reports_incomparable() {
        let arr = Value::array(vec![Value::dictionary(), Value::dictionary()]);
        assert!(call(&arr, "sort", &[]).is_err());
    }

    #[test]
    fn test_sort_with_nan_and_mixed_kinds() {
        let items: Vec<Value> = (0..30)
            .map(|i| if i % 3 == 0 { Value::Number(f64::NAN) } else { Value::from(30 - i) })
            .collect();
        let sorted = call(&Value::array(items), "sort", &[]).unwrap();
        let sorted = sorted.as_array().unwrap().to_vec();
        assert_eq!(sorted.len(), 30);
        assert_eq!(sorted[0], Value::from(1));
        assert!(sorted[19].as_number().unwrap() == 29.0);
        assert!(sorted[20..].iter().all(|v| v.as_number().is_some_and(f64::is_nan)));

        let len = lookup_method(&numbers(&[]), "len").unwrap();
        let mixed = Value::array(vec![
            Value::Function(Arc::clone(&len)),
            Value::from(-1),
            Value::Empty,
            Value::from("a"),
            Value::from(3),
        ]);
        let sorted = call(&mixed, "sort", &[]).unwrap();
        let kinds: Vec<_> = sorted
            .as_array()
            .unwrap()
            .to_vec()
            .iter()
            .map(|v| v.type_name().to_string())
            .collect();
        assert_eq!(kinds, vec!["Number", "Empty", "Number", "String", "Function"]);
    }

    #[test]
    fn test_sort_survives_inconsistent_comparator() {
        let ctx = EvalContext::new();
        let mut frame = ScriptFrame::new(&ctx);
        let always = Function::native("always", 2, |_, _, _| Ok(Value::from(true)));
        let arr = numbers(&[5, 3, 9, 1, 7, 2, 8]);
        let method = lookup_method(&arr, "sort").unwrap();
        let FunctionBody::Native(sort) = &method.body else {
            unreachable!()
        };
        let sorted = sort(&mut frame, &arr, &[Value::Function(Arc::new(always))]).unwrap();
        let mut seen: Vec<_> = sorted
            .as_array()
            .unwrap()
            .to_vec()
            .iter()
            .map(|v| v.as_number().unwrap() as i64)
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2, 3, 5, 7, 8, 9]);
    }

    #[test]
    fn test_frozen_array_rejects_add() {
        let arr = numbers(&[1]);
        call(&arr, "freeze", &[]).unwrap();
        let err = call(&arr, "add", &[Value::from(2)]).unwrap_err();
        assert!(matches!(err, EvalError::Container { .. }));
    }

    #[test]
    fn test_dictionary_methods() {
        let dict = Value::dictionary_from([("a", Value::from(1))]);
        call(&dict, "set", &[Value::from("b"), Value::from(2)]).unwrap();
        assert_eq!(call(&dict, "get", &[Value::from("b")]).unwrap(), Value::from(2));
        assert!(call(&dict, "get", &[Value::from("zz")]).unwrap().is_empty());
        assert_eq!(
            call(&dict, "keys", &[]).unwrap(),
            Value::array(vec![Value::from("a"), Value::from("b")])
        );
        call(&dict, "remove", &[Value::from("a")]).unwrap();
        assert_eq!(call(&dict, "contains", &[Value::from("a")]).unwrap(), Value::from(false));
    }

    #[test]
    fn test_string_methods() {
        let s = Value::from("  Web,Db ");
        assert_eq!(call(&s, "trim", &[]).unwrap(), Value::from("Web,Db"));
        assert_eq!(call(&Value::from("Web"), "upper", &[]).unwrap(), Value::from("WEB"));
        assert_eq!(
            call(&Value::from("a,b"), "split", &[Value::from(",")]).unwrap(),
            Value::array(vec![Value::from("a"), Value::from("b")])
        );
        assert_eq!(
            call(&Value::from("hello"), "substr", &[Value::from(1), Value::from(3)]).unwrap(),
            Value::from("ell")
        );
        assert_eq!(
            call(&Value::from("hello"), "contains", &[Value::from("ll")]).unwrap(),
            Value::from(true)
        );
    }
}
