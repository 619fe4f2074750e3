//! Binary and logical operator evaluation

use super::{Evaluate, ExpressionResult};
use crate::environment::ScriptFrame;
use crate::error::EvalError;
use crate::expr::{BinaryOp, ExprBinary, ExprLogical, LogicalOp};
use crate::value::Value;

/// Both operands are always evaluated, left first.
impl Evaluate for ExprBinary {
    fn eval(&self, frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        let left = check_result!(self.left.evaluate(frame)?);
        let right = check_result!(self.right.evaluate(frame)?);
        Ok(apply_binary(self.op, &left, &right)?.into())
    }
}

/// Apply a binary operator to evaluated operands.
///
/// Shared with compound assignment (`+=` and friends).
pub fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let value = match op {
        // Arithmetic
        BinaryOp::Add => left.plus(right)?,
        BinaryOp::Subtract => left.minus(right)?,
        BinaryOp::Multiply => left.times(right)?,
        BinaryOp::Divide => left.divided_by(right)?,
        BinaryOp::Modulo => left.modulo(right)?,

        // Bitwise
        BinaryOp::Xor => left.bit_xor(right)?,
        BinaryOp::BinaryAnd => left.bit_and(right)?,
        BinaryOp::BinaryOr => left.bit_or(right)?,
        BinaryOp::ShiftLeft => left.shift_left(right)?,
        BinaryOp::ShiftRight => left.shift_right(right)?,

        // Comparison
        BinaryOp::Equal => Value::Boolean(left == right),
        BinaryOp::NotEqual => Value::Boolean(left != right),
        BinaryOp::LessThan => Value::Boolean(left.less_than(right)?),
        BinaryOp::GreaterThan => Value::Boolean(left.greater_than(right)?),
        BinaryOp::LessThanOrEqual => Value::Boolean(left.less_or_equal(right)?),
        BinaryOp::GreaterThanOrEqual => Value::Boolean(left.greater_or_equal(right)?),

        // Membership
        BinaryOp::In => Value::Boolean(left.contained_in(right)?),
        BinaryOp::NotIn => Value::Boolean(!left.contained_in(right)?),
    };
    Ok(value)
}

/// `&&` and `||` short-circuit: the right operand is only evaluated when
/// the left one does not decide the result.
impl Evaluate for ExprLogical {
    fn eval(&self, frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        let left = check_result!(self.left.evaluate(frame)?).to_bool();

        let decided = match self.op {
            LogicalOp::And => !left,
            LogicalOp::Or => left,
        };
        if decided {
            return Ok(Value::Boolean(left).into());
        }

        let right = check_result!(self.right.evaluate(frame)?);
        Ok(Value::Boolean(right.to_bool()).into())
    }
}
