//! `try`/`except` and `throw`

use super::{Evaluate, ExpressionResult};
use crate::environment::ScriptFrame;
use crate::error::EvalError;
use crate::expr::{ExprThrow, ExprTryExcept};

impl Evaluate for ExprTryExcept {
    fn eval(&self, frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        match self.body.evaluate(frame) {
            Ok(result) => Ok(result),
            Err(EvalError::Interrupted) => Err(EvalError::Interrupted),
            Err(err) => {
                tracing::debug!(error = %err.diagnostic(), "caught by except handler");
                self.handler.evaluate(frame)
            }
        }
    }
}

impl Evaluate for ExprThrow {
    fn eval(&self, frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        let message = check_result!(self.message.evaluate(frame)?);
        Err(EvalError::script(message.to_string()))
    }
}
