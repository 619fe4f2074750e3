//! Return, break and continue evaluation

use super::{Evaluate, ExpressionResult};
use crate::environment::ScriptFrame;
use crate::error::EvalError;
use crate::expr::{ExprBreak, ExprContinue, ExprReturn};
use crate::value::Value;

impl Evaluate for ExprReturn {
    fn eval(&self, frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        let value = match &self.value {
            Some(expr) => check_result!(expr.evaluate(frame)?),
            None => Value::Empty,
        };
        Ok(ExpressionResult::return_value(value))
    }
}

impl Evaluate for ExprBreak {
    fn eval(&self, _frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        Ok(ExpressionResult::break_loop())
    }
}

impl Evaluate for ExprContinue {
    fn eval(&self, _frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        Ok(ExpressionResult::continue_loop())
    }
}
