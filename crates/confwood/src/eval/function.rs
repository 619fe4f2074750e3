//! Function definition evaluation

use std::sync::Arc;

use super::{check_sandbox, Evaluate, ExpressionResult};
use crate::container::Dictionary;
use crate::environment::ScriptFrame;
use crate::error::EvalError;
use crate::expr::{ClosedVars, ExprFunction};
use crate::value::{Function, Value};

impl Evaluate for ExprFunction {
    fn eval(&self, frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        check_sandbox(frame, "Function definitions")?;

        let closure = evaluate_closed_vars(frame, &self.closed_vars)?;
        let function = Function::script(
            self.name.as_str(),
            self.params.clone(),
            Arc::clone(&self.body),
            closure,
        );
        Ok(Value::from(function).into())
    }
}

/// Evaluate `use (...)` variables into a new scope.
///
/// Returns `None` when nothing is captured. The scope has no parent: a
/// body only sees what it captured explicitly, not the scope it was
/// defined in.
pub(crate) fn evaluate_closed_vars(
    frame: &mut ScriptFrame<'_>,
    closed_vars: &ClosedVars,
) -> Result<Option<Arc<Dictionary>>, EvalError> {
    if closed_vars.is_empty() {
        return Ok(None);
    }

    let scope = Dictionary::new();
    for (name, expr) in closed_vars {
        let value = expr.evaluate_value(frame)?;
        scope.set(name.as_str(), value)?;
    }
    Ok(Some(Arc::new(scope)))
}
