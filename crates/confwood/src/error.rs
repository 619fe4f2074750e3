//! Error types for configuration evaluation

use thiserror::Error;

use crate::debug_info::DebugInfo;

// ═══════════════════════════════════════════════════════════════════════
// Container Errors
// ═══════════════════════════════════════════════════════════════════════

/// Errors raised by `Array` and `Dictionary` operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContainerError {
    /// Attempt to modify a frozen container
    #[error("{kind} must not be modified after it was frozen")]
    Frozen {
        /// "Array" or "Dictionary"
        kind: &'static str,
    },

    /// Array index outside `[0, len)`
    #[error("Array index {index} is out of bounds (length {len})")]
    IndexOutOfRange {
        /// Requested index
        index: i64,
        /// Length at the time of the access
        len: usize,
    },

    /// Setting `__parent` would make the scope chain cyclic
    #[error("Setting '__parent' would create a cycle in the scope chain")]
    ScopeCycle,
}

// ═══════════════════════════════════════════════════════════════════════
// Reflection Errors
// ═══════════════════════════════════════════════════════════════════════

/// Errors raised by reflected domain objects when a field is written
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    /// The field exists but cannot be written from script
    #[error("Field '{field}' of type '{type_name}' is read-only")]
    ReadOnly {
        /// Object type name
        type_name: String,
        /// Field name
        field: String,
    },

    /// The value was rejected by the field's validator
    #[error("Invalid value for field '{field}': {message}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Why the value was rejected
        message: String,
    },
}

// ═══════════════════════════════════════════════════════════════════════
// Evaluation Errors
// ═══════════════════════════════════════════════════════════════════════

/// Errors that can occur during evaluation.
///
/// Every variant carries an optional source location. Errors are usually
/// created without one; `Expr::evaluate` attaches the location of the
/// innermost node the error passed through.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Operator applied to operands it does not support
    #[error("{message}")]
    Operator {
        /// Description including the operand types
        message: String,
        /// Where it happened
        location: Option<DebugInfo>,
    },

    /// Side-effecting construct used in a sandboxed frame
    #[error("{construct} is not allowed in sandbox mode")]
    SandboxViolation {
        /// Human readable name of the forbidden construct
        construct: String,
        /// Where it happened
        location: Option<DebugInfo>,
    },

    /// `import` named a template that does not exist
    #[error("Import references unknown template: '{name}' of type '{type_name}'")]
    UnknownTemplate {
        /// Type of the importing object
        type_name: String,
        /// Template name
        name: String,
        /// Where it happened
        location: Option<DebugInfo>,
    },

    /// Call target is not a function
    #[error("Function '{name}' does not exist")]
    UnknownFunction {
        /// Name or description of the callee
        name: String,
        /// Where it happened
        location: Option<DebugInfo>,
    },

    /// Evaluation nested deeper than the configured limit
    #[error("Stack overflow: evaluation depth {depth} exceeds the limit of {max}")]
    StackOverflow {
        /// Depth that was reached
        depth: usize,
        /// Configured maximum
        max: usize,
        /// Where it happened
        location: Option<DebugInfo>,
    },

    /// Value of the wrong kind for the operation
    #[error("{message}")]
    TypeMismatch {
        /// Description of the mismatch
        message: String,
        /// Where it happened
        location: Option<DebugInfo>,
    },

    /// Function called with too few arguments
    #[error("Too few arguments for function '{name}': expected at least {expected}, got {got}")]
    Arity {
        /// Function name
        name: String,
        /// Minimum number of arguments
        expected: usize,
        /// Number of arguments passed
        got: usize,
        /// Where it happened
        location: Option<DebugInfo>,
    },

    /// Container operation failed
    #[error("{source}")]
    Container {
        /// Underlying container error
        #[source]
        source: ContainerError,
        /// Where it happened
        location: Option<DebugInfo>,
    },

    /// Reflected field write failed
    #[error("{source}")]
    Field {
        /// Underlying field error
        #[source]
        source: FieldError,
        /// Where it happened
        location: Option<DebugInfo>,
    },

    /// An item with the same type and name was already registered
    #[error("An object with type '{type_name}' and name '{name}' already exists")]
    DuplicateObject {
        /// Object type
        type_name: String,
        /// Object name
        name: String,
        /// Where it happened
        location: Option<DebugInfo>,
    },

    /// A constant was defined twice
    #[error("Constant '{name}' is already defined")]
    ConstantRedefined {
        /// Constant name
        name: String,
        /// Where it happened
        location: Option<DebugInfo>,
    },

    /// Error raised from script with `throw`
    #[error("{message}")]
    Script {
        /// Thrown message
        message: String,
        /// Where it happened
        location: Option<DebugInfo>,
    },

    /// Evaluation was interrupted through the context's interrupt flag
    #[error("Evaluation interrupted")]
    Interrupted,
}

impl EvalError {
    /// Create an operator error.
    pub fn operator(message: impl Into<String>) -> Self {
        EvalError::Operator {
            message: message.into(),
            location: None,
        }
    }

    /// Create an operator error for a binary operator.
    pub fn binary_operator(op: &str, left: &str, right: &str) -> Self {
        Self::operator(format!(
            "Operator {op} cannot be applied to values of type '{left}' and '{right}'"
        ))
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        EvalError::TypeMismatch {
            message: message.into(),
            location: None,
        }
    }

    /// Create a sandbox violation error.
    pub fn sandbox(construct: impl Into<String>) -> Self {
        EvalError::SandboxViolation {
            construct: construct.into(),
            location: None,
        }
    }

    /// Create a user error (`throw`).
    pub fn script(message: impl Into<String>) -> Self {
        EvalError::Script {
            message: message.into(),
            location: None,
        }
    }

    /// The attached source location, if any.
    pub fn location(&self) -> Option<&DebugInfo> {
        match self {
            EvalError::Operator { location, .. }
            | EvalError::SandboxViolation { location, .. }
            | EvalError::UnknownTemplate { location, .. }
            | EvalError::UnknownFunction { location, .. }
            | EvalError::StackOverflow { location, .. }
            | EvalError::TypeMismatch { location, .. }
            | EvalError::Arity { location, .. }
            | EvalError::Container { location, .. }
            | EvalError::Field { location, .. }
            | EvalError::DuplicateObject { location, .. }
            | EvalError::ConstantRedefined { location, .. }
            | EvalError::Script { location, .. } => location.as_ref(),
            EvalError::Interrupted => None,
        }
    }

    fn location_slot(&mut self) -> Option<&mut Option<DebugInfo>> {
        match self {
            EvalError::Operator { location, .. }
            | EvalError::SandboxViolation { location, .. }
            | EvalError::UnknownTemplate { location, .. }
            | EvalError::UnknownFunction { location, .. }
            | EvalError::StackOverflow { location, .. }
            | EvalError::TypeMismatch { location, .. }
            | EvalError::Arity { location, .. }
            | EvalError::Container { location, .. }
            | EvalError::Field { location, .. }
            | EvalError::DuplicateObject { location, .. }
            | EvalError::ConstantRedefined { location, .. }
            | EvalError::Script { location, .. } => Some(location),
            EvalError::Interrupted => None,
        }
    }

    /// Attach a location unless one is already present.
    pub fn with_location(mut self, debug_info: &DebugInfo) -> Self {
        if let Some(slot) = self.location_slot() {
            if slot.is_none() {
                *slot = Some(debug_info.clone());
            }
        }
        self
    }

    /// True for sandbox violations.
    pub fn is_sandbox_violation(&self) -> bool {
        matches!(self, EvalError::SandboxViolation { .. })
    }

    /// Message followed by the location, as shown to configuration authors.
    pub fn diagnostic(&self) -> String {
        match self.location() {
            Some(location) => format!("{self}\nLocation: {location}"),
            None => self.to_string(),
        }
    }
}

impl From<ContainerError> for EvalError {
    fn from(source: ContainerError) -> Self {
        EvalError::Container {
            source,
            location: None,
        }
    }
}

impl From<FieldError> for EvalError {
    fn from(source: FieldError) -> Self {
        EvalError::Field {
            source,
            location: None,
        }
    }
}

/// Result type alias for evaluation
pub type Result<T> = std::result::Result<T, EvalError>;
