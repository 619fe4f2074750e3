//! Control flow signals for return/break/continue

use crate::value::Value;

/// How evaluation of a node ended.
///
/// `return`, `break` and `continue` are not errors: they travel upward as
/// part of the result until a loop or function call consumes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCode {
    /// Normal completion
    Ok,
    /// `return` unwinding to the enclosing function call
    Return,
    /// `break` unwinding to the innermost loop
    Break,
    /// `continue` unwinding to the innermost loop
    Continue,
}

/// Value produced by evaluating a node, plus its control code.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionResult {
    value: Value,
    code: ControlCode,
}

impl ExpressionResult {
    /// Normal completion with `value`.
    pub fn ok(value: Value) -> Self {
        Self {
            value,
            code: ControlCode::Ok,
        }
    }

    /// Return from the enclosing function with `value`.
    pub fn return_value(value: Value) -> Self {
        Self {
            value,
            code: ControlCode::Return,
        }
    }

    /// Break out of the innermost loop.
    pub fn break_loop() -> Self {
        Self {
            value: Value::Empty,
            code: ControlCode::Break,
        }
    }

    /// Skip to the next iteration of the innermost loop.
    pub fn continue_loop() -> Self {
        Self {
            value: Value::Empty,
            code: ControlCode::Continue,
        }
    }

    /// The carried value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The control code.
    pub fn code(&self) -> ControlCode {
        self.code
    }

    /// True for normal completion.
    pub fn is_ok(&self) -> bool {
        self.code == ControlCode::Ok
    }

    /// Take the carried value, dropping the control code.
    pub fn into_value(self) -> Value {
        self.value
    }
}

impl From<Value> for ExpressionResult {
    fn from(value: Value) -> Self {
        Self::ok(value)
    }
}
