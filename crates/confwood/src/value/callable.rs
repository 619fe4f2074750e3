//! Callable values: native and script functions

use std::sync::Arc;

use crate::container::Dictionary;
use crate::environment::ScriptFrame;
use crate::error::EvalError;
use crate::expr::Expr;

use super::Value;

/// Signature of a native function: frame, receiver (`this`), arguments.
pub type NativeFn =
    Arc<dyn Fn(&mut ScriptFrame<'_>, &Value, &[Value]) -> Result<Value, EvalError> + Send + Sync>;

/// What runs when a function is called.
#[derive(Clone)]
pub enum FunctionBody {
    /// Implemented in Rust
    Native(NativeFn),

    /// Implemented in script
    Script {
        /// Function body
        body: Arc<Expr>,
        /// Scope holding the closed-over variables, parent of every call's locals
        closure: Option<Arc<Dictionary>>,
    },
}

/// A callable value.
#[derive(Clone)]
pub struct Function {
    /// Function name (for display/debugging)
    pub name: String,

    /// Parameter names, bound positionally for script functions
    pub params: Vec<String>,

    /// Minimum number of arguments
    pub min_args: usize,

    /// Whether the function may be called from sandboxed frames
    pub side_effect_free: bool,

    /// The implementation
    pub body: FunctionBody,
}

impl Function {
    /// Create a native function. Native functions are assumed to have side
    /// effects until marked otherwise with [`side_effect_free`](Self::side_effect_free).
    pub fn native<F>(name: impl Into<String>, min_args: usize, func: F) -> Self
    where
        F: Fn(&mut ScriptFrame<'_>, &Value, &[Value]) -> Result<Value, EvalError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            params: Vec::new(),
            min_args,
            side_effect_free: false,
            body: FunctionBody::Native(Arc::new(func)),
        }
    }

    /// Create a script function.
    pub fn script(
        name: impl Into<String>,
        params: Vec<String>,
        body: Arc<Expr>,
        closure: Option<Arc<Dictionary>>,
    ) -> Self {
        Self {
            name: name.into(),
            min_args: params.len(),
            params,
            side_effect_free: false,
            body: FunctionBody::Script { body, closure },
        }
    }

    /// Mark the function as callable from sandboxed frames.
    pub fn side_effect_free(mut self) -> Self {
        self.side_effect_free = true;
        self
    }

    /// True for functions implemented in Rust.
    pub fn is_native(&self) -> bool {
        matches!(self.body, FunctionBody::Native(_))
    }
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.is_native() { "Native" } else { "Script" };
        write!(f, "{}Function({})", kind, self.name)
    }
}
