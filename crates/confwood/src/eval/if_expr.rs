//! Conditional evaluation

use super::{Evaluate, ExpressionResult};
use crate::environment::ScriptFrame;
use crate::error::EvalError;
use crate::expr::ExprConditional;
use crate::value::Value;

impl Evaluate for ExprConditional {
    fn eval(&self, frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        let condition = check_result!(self.condition.evaluate(frame)?);

        if condition.to_bool() {
            self.then_branch.evaluate(frame)
        } else if let Some(else_branch) = &self.else_branch {
            else_branch.evaluate(frame)
        } else {
            Ok(Value::Empty.into())
        }
    }
}
