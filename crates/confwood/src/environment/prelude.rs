//! Standard prelude with built-in functions

use super::ScriptFrame;
use crate::container::Dictionary;
use crate::error::EvalError;
use crate::value::{Function, Value};

/// Load the standard prelude into `globals`.
///
/// Existing entries with the same names are replaced. Frozen globals are
/// written anyway.
pub fn load_prelude(globals: &Dictionary) {
    // Introspection and conversion
    define(globals, Function::native("len", 1, builtin_len).side_effect_free());
    define(globals, Function::native("typeof", 1, builtin_typeof).side_effect_free());
    define(globals, Function::native("string", 1, builtin_string).side_effect_free());
    define(globals, Function::native("number", 1, builtin_number).side_effect_free());
    define(globals, Function::native("bool", 1, builtin_bool).side_effect_free());
    define(globals, Function::native("range", 1, builtin_range).side_effect_free());

    // Output
    define(globals, Function::native("log", 0, builtin_log));

    let json = namespace([
        Function::native("encode", 1, builtin_json_encode).side_effect_free(),
        Function::native("decode", 1, builtin_json_decode).side_effect_free(),
    ]);
    globals.set_with("Json".to_string(), json, true).ok();

    let math = namespace([
        Function::native("min", 1, builtin_math_min).side_effect_free(),
        Function::native("max", 1, builtin_math_max).side_effect_free(),
        Function::native("abs", 1, |_, _, args| unary_math(args, f64::abs)).side_effect_free(),
        Function::native("floor", 1, |_, _, args| unary_math(args, f64::floor))
            .side_effect_free(),
        Function::native("ceil", 1, |_, _, args| unary_math(args, f64::ceil)).side_effect_free(),
    ]);
    globals.set_with("Math".to_string(), math, true).ok();
}

fn define(globals: &Dictionary, func: Function) {
    // Writes with override only fail on a __parent cycle, which a function
    // name can never cause.
    globals
        .set_with(func.name.clone(), Value::from(func), true)
        .ok();
}

fn namespace<const N: usize>(funcs: [Function; N]) -> Value {
    let ns: Dictionary = funcs
        .into_iter()
        .map(|f| (f.name.clone(), Value::from(f)))
        .collect();
    ns.freeze();
    Value::from(ns)
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Function Implementations
// ═══════════════════════════════════════════════════════════════════════

fn builtin_len(_: &mut ScriptFrame<'_>, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let len = match &args[0] {
        Value::Empty => 0,
        Value::String(s) => s.chars().count(),
        Value::Array(a) => a.len(),
        Value::Dictionary(d) => d.len(),
        other => {
            return Err(EvalError::type_mismatch(format!(
                "len() cannot be applied to a value of type '{}'",
                other.type_name()
            )))
        }
    };
    Ok(Value::from(len))
}

fn builtin_typeof(_: &mut ScriptFrame<'_>, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::string(args[0].type_name()))
}

fn builtin_string(_: &mut ScriptFrame<'_>, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    match &args[0] {
        s @ Value::String(_) => Ok(s.clone()),
        other => Ok(Value::string(other.to_string())),
    }
}

fn builtin_number(_: &mut ScriptFrame<'_>, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Number(args[0].to_number()?))
}

fn builtin_bool(_: &mut ScriptFrame<'_>, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Boolean(args[0].to_bool()))
}

/// Longest array `range()` will build.
const MAX_RANGE_LEN: usize = 1 << 24;

fn builtin_range(_: &mut ScriptFrame<'_>, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let (start, end, step) = match args {
        [end] => (0.0, end.to_number()?, 1.0),
        [start, end] => (start.to_number()?, end.to_number()?, 1.0),
        [start, end, step, ..] => (start.to_number()?, end.to_number()?, step.to_number()?),
        [] => {
            return Err(EvalError::Arity {
                name: "range".to_string(),
                expected: 1,
                got: 0,
                location: None,
            })
        }
    };

    if step == 0.0 || !step.is_finite() {
        return Err(EvalError::type_mismatch("range() step must be a non-zero number"));
    }

    let count = ((end - start) / step).ceil();
    if count.is_nan() || count <= 0.0 {
        return Ok(Value::array(Vec::new()));
    }
    if count > MAX_RANGE_LEN as f64 {
        return Err(EvalError::type_mismatch(format!(
            "range() would produce more than {MAX_RANGE_LEN} elements"
        )));
    }

    let items = (0..count as usize)
        .map(|i| Value::Number(start + i as f64 * step))
        .collect();
    Ok(Value::array(items))
}

fn builtin_log(_: &mut ScriptFrame<'_>, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let message = args
        .iter()
        .map(|arg| arg.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    tracing::info!(target: "confwood::script", "{}", message);
    Ok(Value::Empty)
}

fn builtin_json_encode(_: &mut ScriptFrame<'_>, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::string(args[0].to_json_string()?))
}

fn builtin_json_decode(_: &mut ScriptFrame<'_>, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    match &args[0] {
        Value::String(s) => Value::from_json_str(s),
        other => Err(EvalError::type_mismatch(format!(
            "Json.decode() expects a String, got '{}'",
            other.type_name()
        ))),
    }
}

fn builtin_math_min(_: &mut ScriptFrame<'_>, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    fold_numbers(args, f64::min)
}

fn builtin_math_max(_: &mut ScriptFrame<'_>, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    fold_numbers(args, f64::max)
}

fn fold_numbers(args: &[Value], pick: fn(f64, f64) -> f64) -> Result<Value, EvalError> {
    let mut result: Option<f64> = None;
    for arg in args {
        let n = arg.to_number()?;
        result = Some(result.map_or(n, |acc| pick(acc, n)));
    }
    Ok(result.map(Value::Number).unwrap_or_default())
}

fn unary_math(args: &[Value], op: fn(f64) -> f64) -> Result<Value, EvalError> {
    Ok(Value::Number(op(args[0].to_number()?)))
}
