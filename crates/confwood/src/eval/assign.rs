//! Assignment evaluation

use super::binary::apply_binary;
use super::{check_sandbox, Evaluate, ExpressionResult};
use crate::environment::ScriptFrame;
use crate::error::EvalError;
use crate::expr::ExprSet;
use crate::value::Value;

impl Evaluate for ExprSet {
    fn eval(&self, frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        check_sandbox(frame, "Assignment")?;

        let reference = self.target.reference(frame, true)?.ok_or_else(|| {
            EvalError::type_mismatch(format!(
                "Expression '{}' cannot be assigned to",
                self.target.kind_name()
            ))
        })?;

        let mut value = check_result!(self.value.evaluate(frame)?);
        if let Some(op) = self.op.binary_op() {
            let old = reference.get(frame)?;
            value = apply_binary(op, &old, &value)?;
        }

        reference.set(frame, value, self.override_frozen)?;
        Ok(Value::Empty.into())
    }
}
