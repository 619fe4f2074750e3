//! Function call evaluation

use std::sync::Arc;

use super::index::get_field;
use super::{Evaluate, ExpressionResult};
use crate::container::Dictionary;
use crate::environment::ScriptFrame;
use crate::error::EvalError;
use crate::expr::{Expr, ExprCall};
use crate::value::{Function, FunctionBody, Value};

impl Evaluate for ExprCall {
    fn eval(&self, frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        // `a.f(x)` calls f with `this` bound to a
        let (this, callee) = match self.callee.as_ref() {
            Expr::Indexer(indexer) => {
                let base = check_result!(indexer.base.evaluate(frame)?);
                let index = check_result!(indexer.index.evaluate(frame)?);
                let callee = get_field(&base, &index)?;
                (base, callee)
            }
            other => (Value::Empty, check_result!(other.evaluate(frame)?)),
        };

        let func = match callee {
            Value::Function(func) => func,
            other => {
                return Err(EvalError::UnknownFunction {
                    name: callee_name(&self.callee, &other),
                    location: None,
                })
            }
        };

        check_callable(frame, &func)?;

        let mut args = Vec::with_capacity(self.args.len());
        for arg in &self.args {
            args.push(check_result!(arg.evaluate(frame)?));
        }

        Ok(invoke(&func, frame, this, &args)?.into())
    }
}

fn callee_name(expr: &Expr, value: &Value) -> String {
    match expr {
        Expr::Variable(var) => var.name.clone(),
        Expr::Indexer(indexer) => match indexer.index.as_ref() {
            Expr::Literal(lit) => lit.value.to_string(),
            _ => value.type_name().to_string(),
        },
        _ => value.type_name().to_string(),
    }
}

fn check_callable(frame: &ScriptFrame<'_>, func: &Function) -> Result<(), EvalError> {
    if frame.sandboxed && !func.side_effect_free {
        return Err(EvalError::sandbox(format!("Calling function '{}'", func.name)));
    }
    Ok(())
}

/// Call `func` with receiver `this`.
///
/// The call runs in a fresh frame that inherits depth, sandbox flag and
/// imports from `frame`. Script functions get new locals seeded with a
/// copy of their captured variables, with parameters bound positionally;
/// surplus arguments are ignored. A `return` in the body ends the call with its value.
///
/// # Errors
///
/// `SandboxViolation` when calling a function with side effects from a
/// sandboxed frame, `Arity` when fewer than `min_args` arguments are
/// passed, and anything the function body raises.
pub fn invoke(
    func: &Function,
    frame: &ScriptFrame<'_>,
    this: Value,
    args: &[Value],
) -> Result<Value, EvalError> {
    check_callable(frame, func)?;
    if args.len() < func.min_args {
        return Err(EvalError::Arity {
            name: func.name.clone(),
            expected: func.min_args,
            got: args.len(),
            location: None,
        });
    }

    let mut callee = frame.call_frame();
    match &func.body {
        FunctionBody::Native(native) => native(&mut callee, &this, args),

        FunctionBody::Script { body, closure } => {
            let locals = Arc::new(Dictionary::new());
            if let Some(closure) = closure {
                closure.copy_to(&locals)?;
            }
            for (param, arg) in func.params.iter().zip(args) {
                locals.set(param.as_str(), arg.clone())?;
            }
            callee.locals = Some(locals);
            callee.this = this;

            Ok(body.evaluate(&mut callee)?.into_value())
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::expr::{BinaryOp, SetOp};
    use crate::EvalContext;

    fn define(frame: &mut ScriptFrame<'_>, name: &str, function: Expr) {
        let value = function.evaluate_value(frame).unwrap();
        frame.define(name, value).unwrap();
    }

    #[test]
    fn test_script_function_binds_params() {
        let ctx = EvalContext::new();
        let mut frame = ScriptFrame::new(&ctx);
        define(
            &mut frame,
            "add",
            Expr::function(
                "add",
                vec!["a", "b"],
                Expr::binary(BinaryOp::Add, Expr::variable("a"), Expr::variable("b")),
            ),
        );

        let call = Expr::call(Expr::variable("add"), vec![Expr::literal(2), Expr::literal(3)]);
        assert_eq!(call.evaluate_value(&mut frame).unwrap(), Value::from(5));
    }

    #[test]
    fn test_return_ends_the_call_only() {
        let ctx = EvalContext::new();
        let mut frame = ScriptFrame::new(&ctx);
        define(
            &mut frame,
            "first",
            Expr::function(
                "first",
                vec![],
                Expr::block(vec![
                    Expr::return_value(Some(Expr::literal(1))),
                    Expr::literal(2),
                ]),
            ),
        );

        let result = Expr::call(Expr::variable("first"), vec![])
            .evaluate(&mut frame)
            .unwrap();
        assert!(result.is_ok());
        assert_eq!(result.into_value(), Value::from(1));
    }

    #[test]
    fn test_method_call_binds_this() {
        let ctx = EvalContext::new();
        let mut frame = ScriptFrame::new(&ctx);
        frame
            .define("host", Value::dictionary_from([("address", Value::from("10.0.0.1"))]))
            .unwrap();
        define(
            &mut frame,
            "addr",
            Expr::function("addr", vec![], Expr::variable("address")),
        );
        let host = frame.get("host");
        host.as_dictionary()
            .unwrap()
            .set("addr", frame.get("addr"))
            .unwrap();

        let call = Expr::method_call(Expr::variable("host"), "addr", vec![]);
        assert_eq!(call.evaluate_value(&mut frame).unwrap(), Value::from("10.0.0.1"));
    }

    #[test]
    fn test_too_few_arguments() {
        let ctx = EvalContext::new();
        let mut frame = ScriptFrame::new(&ctx);
        define(
            &mut frame,
            "pair",
            Expr::function("pair", vec!["a", "b"], Expr::empty()),
        );
        let err = Expr::call(Expr::variable("pair"), vec![Expr::literal(1)])
            .evaluate(&mut frame)
            .unwrap_err();
        assert!(matches!(err, EvalError::Arity { expected: 2, got: 1, .. }));
    }

    #[test]
    fn test_unknown_function_names_the_callee() {
        let ctx = EvalContext::new();
        let mut frame = ScriptFrame::new(&ctx);
        let err = Expr::call(Expr::variable("nope"), vec![])
            .evaluate(&mut frame)
            .unwrap_err();
        assert_eq!(err.to_string(), "Function 'nope' does not exist");
    }

    #[test]
    fn test_sandbox_blocks_impure_before_args() {
        let ctx = EvalContext::new();
        let mut frame = ScriptFrame::new(&ctx).with_sandbox(true);
        let err = Expr::call(
            Expr::variable("log"),
            vec![Expr::throw(Expr::literal("args evaluated"))],
        )
        .evaluate(&mut frame)
        .unwrap_err();
        assert!(err.is_sandbox_violation());
    }

    #[test]
    fn test_sandbox_allows_pure_builtins() {
        let ctx = EvalContext::new();
        let mut frame = ScriptFrame::new(&ctx).with_sandbox(true);
        let call = Expr::call(Expr::variable("len"), vec![Expr::literal("four")]);
        assert_eq!(call.evaluate_value(&mut frame).unwrap(), Value::from(4));
    }

    #[test]
    fn test_closure_sees_captured_value() {
        let ctx = EvalContext::new();
        let mut frame = ScriptFrame::new(&ctx);
        frame.define("base", Value::from(10)).unwrap();

        let mut closed = crate::expr::ClosedVars::new();
        closed.insert("offset".to_string(), Expr::variable("base"));
        define(
            &mut frame,
            "shift",
            Expr::closure(
                "shift",
                vec!["x"],
                closed,
                Expr::binary(BinaryOp::Add, Expr::variable("x"), Expr::variable("offset")),
            ),
        );
        // later changes to `base` are not seen
        Expr::set_op(Expr::variable("base"), SetOp::Add, Expr::literal(1))
            .evaluate(&mut frame)
            .unwrap();

        let call = Expr::call(Expr::variable("shift"), vec![Expr::literal(1)]);
        assert_eq!(call.evaluate_value(&mut frame).unwrap(), Value::from(11));
    }

    #[test]
    fn test_captured_values_are_per_call() {
        let ctx = EvalContext::new();
        let mut frame = ScriptFrame::new(&ctx);

        let mut closed = crate::expr::ClosedVars::new();
        closed.insert("n".to_string(), Expr::literal(0));
        let body = Expr::block(vec![
            Expr::set_op(Expr::variable("n"), SetOp::Add, Expr::literal(1)),
            Expr::variable("n"),
        ]);
        define(&mut frame, "tick", Expr::closure("tick", vec![], closed, body));

        let call = Expr::call(Expr::variable("tick"), vec![]);
        assert_eq!(call.evaluate_value(&mut frame).unwrap(), Value::from(1));
        assert_eq!(call.evaluate_value(&mut frame).unwrap(), Value::from(1));
    }

    #[test]
    fn test_recursion_hits_depth_limit() {
        let ctx = EvalContext::with_max_depth(50);
        let mut frame = ScriptFrame::new(&ctx);
        ctx.globals()
            .set(
                "again",
                Expr::function("again", vec![], Expr::call(Expr::variable("again"), vec![]))
                    .evaluate_value(&mut frame)
                    .unwrap(),
            )
            .unwrap();
        let err = Expr::call(Expr::variable("again"), vec![])
            .evaluate(&mut frame)
            .unwrap_err();
        assert!(matches!(err, EvalError::StackOverflow { max: 50, .. }));
    }
}
