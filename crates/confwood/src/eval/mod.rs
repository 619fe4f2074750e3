//! Expression evaluation
//!
//! [`Expr::evaluate`] is the single entry point. It wraps the per-node
//! [`Evaluate`] implementations with the bookkeeping every node shares:
//! interrupt checks, depth accounting, source locations on errors and the
//! breakpoint hook.

/// Unwrap an [`ExpressionResult`], returning it from the enclosing function
/// unless its control code is `Ok`.
macro_rules! check_result {
    ($res:expr) => {{
        let res = $res;
        if res.code() != $crate::eval::ControlCode::Ok {
            return Ok(res);
        }
        res.into_value()
    }};
}

pub mod array;
pub mod assign;
pub mod binary;
pub mod call;
pub mod control;
pub mod dict;
pub mod function;
pub mod if_expr;
pub mod index;
pub mod item;
pub mod literal;
pub mod loops;
pub mod return_expr;
pub mod scope;
pub mod try_except;
pub mod unary;

pub use call::invoke;
pub use control::{ControlCode, ExpressionResult};
pub use index::Reference;

use crate::environment::ScriptFrame;
use crate::error::EvalError;
use crate::expr::Expr;
use crate::value::Value;

/// Trait for evaluating expression nodes.
///
/// Implemented by every node payload; callers go through
/// [`Expr::evaluate`], never through the payload impls directly.
pub trait Evaluate {
    /// Evaluate this node in the given frame.
    fn eval(&self, frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError>;
}

// ═══════════════════════════════════════════════════════════════════════
// Main Expression Dispatcher
// ═══════════════════════════════════════════════════════════════════════

impl Expr {
    /// Evaluate this expression.
    ///
    /// Errors leave with the location of the innermost node that has one.
    /// The breakpoint hook fires once per error, at that node.
    pub fn evaluate(&self, frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        let ctx = frame.context();
        if ctx.is_interrupted() {
            return Err(EvalError::Interrupted);
        }

        let result = match frame.enter_eval() {
            Ok(()) => {
                if ctx.trace {
                    tracing::trace!(
                        node = self.kind_name(),
                        location = %self.debug_info(),
                        depth = frame.depth(),
                        "evaluate"
                    );
                }
                let result = self.dispatch(frame);
                frame.exit_eval();
                result
            }
            Err(err) => Err(err),
        };

        result.map_err(|err| {
            let debug_info = self.debug_info();
            if err.location().is_some() || debug_info.is_unknown() {
                return err;
            }
            let err = err.with_location(debug_info);
            if err.location().is_some() {
                ctx.breakpoint(frame, Some(&err), debug_info);
            }
            err
        })
    }

    /// Evaluate and drop the control code.
    pub fn evaluate_value(&self, frame: &mut ScriptFrame<'_>) -> Result<Value, EvalError> {
        Ok(self.evaluate(frame)?.into_value())
    }

    fn dispatch(&self, frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        match self {
            Expr::Literal(e) => e.eval(frame),
            Expr::Variable(e) => e.eval(frame),
            Expr::Unary(e) => e.eval(frame),
            Expr::Binary(e) => e.eval(frame),
            Expr::Logical(e) => e.eval(frame),
            Expr::Indexer(e) => e.eval(frame),
            Expr::Set(e) => e.eval(frame),
            Expr::Array(e) => e.eval(frame),
            Expr::Dict(e) => e.eval(frame),
            Expr::Conditional(e) => e.eval(frame),
            Expr::While(e) => e.eval(frame),
            Expr::For(e) => e.eval(frame),
            Expr::Return(e) => e.eval(frame),
            Expr::Break(e) => e.eval(frame),
            Expr::Continue(e) => e.eval(frame),
            Expr::TryExcept(e) => e.eval(frame),
            Expr::Throw(e) => e.eval(frame),
            Expr::FunctionCall(e) => e.eval(frame),
            Expr::Function(e) => e.eval(frame),
            Expr::Apply(e) => e.eval(frame),
            Expr::Object(e) => e.eval(frame),
            Expr::Import(e) => e.eval(frame),
            Expr::ImportDefaultTemplates(e) => e.eval(frame),
            Expr::GetScope(e) => e.eval(frame),
            Expr::Using(e) => e.eval(frame),
            Expr::SetConst(e) => e.eval(frame),
            Expr::Breakpoint(e) => e.eval(frame),
        }
    }
}

impl Evaluate for Expr {
    fn eval(&self, frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        self.evaluate(frame)
    }
}

/// Fail with a sandbox violation if the frame is sandboxed.
pub(crate) fn check_sandbox(frame: &ScriptFrame<'_>, construct: &str) -> Result<(), EvalError> {
    if frame.sandboxed {
        return Err(EvalError::sandbox(construct));
    }
    Ok(())
}

/// Require a string operand, e.g. an object or template name.
pub(crate) fn expect_string(value: Value, what: &str) -> Result<String, EvalError> {
    match value {
        Value::String(s) => Ok(s.as_str().to_string()),
        other => Err(EvalError::type_mismatch(format!(
            "{what} must be a string, got '{}'",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::debug_info::DebugInfo;
    use crate::expr::BinaryOp;
    use crate::EvalContext;

    #[test]
    fn test_interrupted_before_evaluation() {
        let ctx = EvalContext::new();
        ctx.interrupt();
        let mut frame = ScriptFrame::new(&ctx);
        let err = Expr::literal(1).evaluate(&mut frame).unwrap_err();
        assert_eq!(err, EvalError::Interrupted);
    }

    #[test]
    fn test_depth_restored_after_error() {
        let ctx = EvalContext::new();
        let mut frame = ScriptFrame::new(&ctx);
        let expr = Expr::binary(BinaryOp::Subtract, Expr::dict(vec![]), Expr::literal("x"));
        assert!(expr.evaluate(&mut frame).is_err());
        assert_eq!(frame.depth(), 0);
    }

    #[test]
    fn test_innermost_location_wins() {
        let ctx = EvalContext::new();
        let mut frame = ScriptFrame::new(&ctx);
        let inner = DebugInfo::at("t.conf", 2, 5);
        let outer = DebugInfo::at("t.conf", 1, 1);

        let expr = Expr::block(vec![Expr::throw(Expr::literal("boom")).at(inner.clone())])
            .at(outer);
        let err = expr.evaluate(&mut frame).unwrap_err();
        assert_eq!(err.location(), Some(&inner));
    }

    #[test]
    fn test_breakpoint_hook_fires_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let ctx = EvalContext::new().with_breakpoint_hook(Arc::new(move |_, err, _| {
            assert!(err.is_some());
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        let mut frame = ScriptFrame::new(&ctx);

        let expr = Expr::block(vec![
            Expr::throw(Expr::literal("boom")).at(DebugInfo::at("t.conf", 3, 1))
        ])
        .at(DebugInfo::at("t.conf", 1, 1));
        assert!(expr.evaluate(&mut frame).is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stack_overflow_is_typed() {
        let ctx = EvalContext::with_max_depth(3);
        let mut frame = ScriptFrame::new(&ctx);
        let deep = Expr::not(Expr::not(Expr::not(Expr::not(Expr::literal(true)))));
        let err = deep.evaluate(&mut frame).unwrap_err();
        assert!(matches!(err, EvalError::StackOverflow { max: 3, .. }));
        assert_eq!(frame.depth(), 0);
    }
}
