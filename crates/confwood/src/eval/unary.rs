//! Unary operator evaluation

use super::{Evaluate, ExpressionResult};
use crate::environment::ScriptFrame;
use crate::error::EvalError;
use crate::expr::{ExprUnary, UnaryOp};
use crate::value::Value;

impl Evaluate for ExprUnary {
    fn eval(&self, frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        let operand = check_result!(self.operand.evaluate(frame)?);

        let value = match self.op {
            UnaryOp::Minus => operand.negate()?,
            UnaryOp::BitNot => operand.bit_not()?,
            UnaryOp::Not => Value::Boolean(!operand.to_bool()),
        };
        Ok(value.into())
    }
}

#[cfg(test)]
mod tests {
    use crate::environment::ScriptFrame;
    use crate::error::EvalError;
    use crate::expr::{Expr, UnaryOp};
    use crate::value::Value;
    use crate::EvalContext;

    fn eval(expr: Expr) -> Result<Value, EvalError> {
        let ctx = EvalContext::new();
        let mut frame = ScriptFrame::new(&ctx);
        expr.evaluate_value(&mut frame)
    }

    #[test]
    fn test_minus() {
        assert_eq!(
            eval(Expr::unary(UnaryOp::Minus, Expr::literal(4))).unwrap(),
            Value::from(-4)
        );
    }

    #[test]
    fn test_bit_not_truncates() {
        assert_eq!(
            eval(Expr::unary(UnaryOp::BitNot, Expr::literal(5.7))).unwrap(),
            Value::from(-6)
        );
    }

    #[test]
    fn test_not_uses_truthiness() {
        assert_eq!(eval(Expr::not(Expr::literal(""))).unwrap(), Value::from(true));
        assert_eq!(eval(Expr::not(Expr::literal(1))).unwrap(), Value::from(false));
        assert_eq!(eval(Expr::not(Expr::empty())).unwrap(), Value::from(true));
    }

    #[test]
    fn test_minus_on_dictionary_fails() {
        let err = eval(Expr::unary(UnaryOp::Minus, Expr::dict(vec![]))).unwrap_err();
        assert!(matches!(err, EvalError::Operator { .. }));
    }
}
