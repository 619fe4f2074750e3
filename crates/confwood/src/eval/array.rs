//! Array literal evaluation

use super::{Evaluate, ExpressionResult};
use crate::environment::ScriptFrame;
use crate::error::EvalError;
use crate::expr::ExprArray;
use crate::value::Value;

/// Evaluate an array literal.
///
/// Elements are evaluated left to right; a control code raised by an
/// element aborts the literal.
impl Evaluate for ExprArray {
    fn eval(&self, frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        let mut items = Vec::with_capacity(self.items.len());
        for item in &self.items {
            items.push(check_result!(item.evaluate(frame)?));
        }
        Ok(Value::array(items).into())
    }
}
