//! Braced block evaluation

use super::{Evaluate, ExpressionResult};
use crate::container::{Dictionary, PARENT_KEY};
use crate::environment::ScriptFrame;
use crate::error::EvalError;
use crate::expr::ExprDict;
use crate::value::Value;

/// Key that, once set in a block's scope, becomes the block's value.
pub const RESULT_KEY: &str = "__result";

impl Evaluate for ExprDict {
    fn eval(&self, frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        if self.inline {
            let mut last = Value::Empty;
            for statement in &self.statements {
                last = check_result!(statement.evaluate(frame)?);
            }
            return Ok(last.into());
        }

        let scope = Dictionary::child_of(&frame.ensure_locals());
        {
            let mut guard = frame.enter_object_scope(scope.clone());
            for statement in &self.statements {
                let result = statement.evaluate(&mut guard)?;
                if !result.is_ok() {
                    return Ok(result);
                }
                if scope.contains(RESULT_KEY) {
                    break;
                }
            }
        }

        if let Some(result) = scope.get(RESULT_KEY) {
            return Ok(result.into());
        }

        let value = scope.shallow_clone();
        value.remove(PARENT_KEY)?;
        Ok(Value::from(value).into())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::expr::Expr;
    use crate::EvalContext;

    #[test]
    fn test_block_returns_last_value() {
        let ctx = EvalContext::new();
        let mut frame = ScriptFrame::new(&ctx);
        let block = Expr::block(vec![
            Expr::set(Expr::variable("a"), Expr::literal(1)),
            Expr::variable("a"),
        ]);
        assert_eq!(block.evaluate_value(&mut frame).unwrap(), Value::from(1));
        // inline blocks write to the current scope
        assert_eq!(frame.get("a"), Value::from(1));
    }

    #[test]
    fn test_dict_collects_assignments() {
        let ctx = EvalContext::new();
        let mut frame = ScriptFrame::new(&ctx);
        frame.define("port", Value::from(5665)).unwrap();

        let dict = Expr::dict(vec![
            Expr::set(Expr::variable("host"), Expr::literal("db1")),
            Expr::set(Expr::variable("port"), Expr::variable("port")),
        ]);
        let value = dict.evaluate_value(&mut frame).unwrap();
        assert_eq!(value.to_string(), r#"{"host":"db1","port":5665}"#);

        // the enclosing scope is untouched
        assert!(frame.lookup("host").is_none());
    }

    #[test]
    fn test_result_key_short_circuits() {
        let ctx = EvalContext::new();
        let mut frame = ScriptFrame::new(&ctx);
        let dict = Expr::dict(vec![
            Expr::set(Expr::variable(RESULT_KEY), Expr::literal("done")),
            Expr::throw(Expr::literal("not reached")),
        ]);
        assert_eq!(dict.evaluate_value(&mut frame).unwrap(), Value::from("done"));
    }

    #[test]
    fn test_scope_restored_after_error() {
        let ctx = EvalContext::new();
        let mut frame = ScriptFrame::new(&ctx);
        let before = frame.ensure_locals();

        let dict = Expr::dict(vec![Expr::throw(Expr::literal("boom"))]);
        assert!(dict.evaluate(&mut frame).is_err());
        assert!(frame.this.is_empty());
        assert!(std::sync::Arc::ptr_eq(&frame.ensure_locals(), &before));
    }
}
