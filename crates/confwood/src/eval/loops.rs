//! Loop evaluation
//!
//! `break` and `continue` stop at the innermost loop; `return` passes
//! through to the enclosing function call.

use std::sync::Arc;

use super::{check_sandbox, ControlCode, Evaluate, ExpressionResult};
use crate::container::{Dictionary, PARENT_KEY};
use crate::environment::ScriptFrame;
use crate::error::EvalError;
use crate::expr::{Expr, ExprFor, ExprWhile};
use crate::lock::ObjectLock;
use crate::value::Value;

/// What a loop should do after one pass of its body.
enum Step {
    Next,
    Stop,
    Leave(ExpressionResult),
}

fn step(result: ExpressionResult) -> Step {
    match result.code() {
        ControlCode::Ok | ControlCode::Continue => Step::Next,
        ControlCode::Break => Step::Stop,
        ControlCode::Return => Step::Leave(result),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// while
// ═══════════════════════════════════════════════════════════════════════

impl Evaluate for ExprWhile {
    fn eval(&self, frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        check_sandbox(frame, "While loops")?;

        loop {
            let condition = check_result!(self.condition.evaluate(frame)?);
            if !condition.to_bool() {
                break;
            }
            match step(self.body.evaluate(frame)?) {
                Step::Next => {}
                Step::Stop => break,
                Step::Leave(result) => return Ok(result),
            }
        }

        Ok(Value::Empty.into())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// for
// ═══════════════════════════════════════════════════════════════════════

impl Evaluate for ExprFor {
    fn eval(&self, frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        let source = check_result!(self.source.evaluate(frame)?);

        match &source {
            Value::Array(array) => {
                if self.value_var.is_some() {
                    return Err(EvalError::type_mismatch(
                        "Cannot use dictionary iterator for array.",
                    ));
                }
                for item in array.to_vec() {
                    let bindings = [(self.key_var.as_str(), item)];
                    match run_iteration(frame, &self.body, bindings)? {
                        Step::Next => {}
                        Step::Stop => break,
                        Step::Leave(result) => return Ok(result),
                    }
                }
            }

            Value::Dictionary(dict) => {
                let Some(value_var) = &self.value_var else {
                    return Err(EvalError::type_mismatch(
                        "Cannot use array iterator for dictionary.",
                    ));
                };
                for key in snapshot_keys(dict) {
                    let value = dict.get(&key).unwrap_or_default();
                    let bindings = [
                        (self.key_var.as_str(), Value::from(key)),
                        (value_var.as_str(), value),
                    ];
                    match run_iteration(frame, &self.body, bindings)? {
                        Step::Next => {}
                        Step::Stop => break,
                        Step::Leave(result) => return Ok(result),
                    }
                }
            }

            other => {
                return Err(EvalError::type_mismatch(format!(
                    "Invalid type in for expression: {}",
                    other.type_name()
                )))
            }
        }

        Ok(Value::Empty.into())
    }
}

fn snapshot_keys(dict: &Dictionary) -> Vec<String> {
    let lock = ObjectLock::new(dict);
    dict.iter(&lock)
        .map(|(key, _)| key)
        .filter(|key| key != PARENT_KEY)
        .collect()
}

/// Run one pass of a `for` body in a fresh scope holding the loop
/// variables.
fn run_iteration<const N: usize>(
    frame: &mut ScriptFrame<'_>,
    body: &Expr,
    bindings: [(&str, Value); N],
) -> Result<Step, EvalError> {
    let scope: Arc<Dictionary> = Dictionary::child_of(&frame.ensure_locals());
    for (name, value) in bindings {
        scope.set(name, value)?;
    }

    let mut guard = frame.enter_scope(scope);
    Ok(step(body.evaluate(&mut guard)?))
}
