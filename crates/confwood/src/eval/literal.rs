//! Literal and variable evaluation

use super::{Evaluate, ExpressionResult};
use crate::environment::ScriptFrame;
use crate::error::EvalError;
use crate::expr::{ExprLiteral, ExprVariable};

impl Evaluate for ExprLiteral {
    fn eval(&self, _frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        Ok(self.value.clone().into())
    }
}

/// Variables resolve through the frame; a name defined nowhere is Empty.
impl Evaluate for ExprVariable {
    fn eval(&self, frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        Ok(frame.get(&self.name).into())
    }
}
