//! Scope access: `locals`/`this`/`globals`, `using`, `const` and `debugger`

use super::{check_sandbox, Evaluate, ExpressionResult};
use crate::environment::ScriptFrame;
use crate::error::EvalError;
use crate::expr::{ExprBreakpoint, ExprGetScope, ExprSetConst, ExprUsing, ScopeSpecifier};
use crate::value::Value;

impl Evaluate for ExprGetScope {
    fn eval(&self, frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        let scope = match self.scope {
            ScopeSpecifier::Local => Value::Dictionary(frame.ensure_locals()),
            ScopeSpecifier::This => frame.this.clone(),
            ScopeSpecifier::Global => Value::Dictionary(frame.context().globals().clone()),
        };
        Ok(scope.into())
    }
}

impl Evaluate for ExprUsing {
    fn eval(&self, frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        check_sandbox(frame, "Using directives")?;

        let namespace = check_result!(self.namespace.evaluate(frame)?);
        if namespace.as_dictionary().is_none() {
            return Err(EvalError::type_mismatch(format!(
                "The parameter to 'using' must be a namespace, got '{}'",
                namespace.type_name()
            )));
        }

        frame.add_import(namespace);
        Ok(Value::Empty.into())
    }
}

impl Evaluate for ExprSetConst {
    fn eval(&self, frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        check_sandbox(frame, "Constant definitions")?;

        let ctx = frame.context();
        if ctx.globals().contains(&self.name) {
            return Err(EvalError::ConstantRedefined {
                name: self.name.clone(),
                location: None,
            });
        }

        let value = check_result!(self.value.evaluate(frame)?);
        ctx.define_constant(&self.name, value)?;
        Ok(Value::Empty.into())
    }
}

impl Evaluate for ExprBreakpoint {
    fn eval(&self, frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        frame.context().breakpoint(frame, None, &self.debug_info);
        Ok(Value::Empty.into())
    }
}
