//! Value representation for runtime values

mod callable;
mod display;
mod impls;
mod json;
mod ops;
mod reflect;

pub use callable::{Function, FunctionBody, NativeFn};
pub(crate) use display::CycleGuard;
pub use reflect::{FieldId, Reflect};

use std::sync::Arc;

use crate::container::{Array, Dictionary};

/// Runtime value of the configuration language.
///
/// Scalars live inline; everything else is a shared handle. Cloning a heap
/// value clones the handle, not the object.
#[derive(Clone, Default)]
pub enum Value {
    // ═══════════════════════════════════════════════════════════════════
    // Scalars
    // ═══════════════════════════════════════════════════════════════════
    /// Absence of a value (`null`)
    #[default]
    Empty,

    /// `true` or `false`
    Boolean(bool),

    /// All numbers are 64-bit floats
    Number(f64),

    /// Immutable string
    String(Arc<String>),

    // ═══════════════════════════════════════════════════════════════════
    // Heap objects
    // ═══════════════════════════════════════════════════════════════════
    /// Shared, lock-protected array
    Array(Arc<Array>),

    /// Shared, lock-protected dictionary (also used for scopes)
    Dictionary(Arc<Dictionary>),

    /// Native or script function
    Function(Arc<Function>),

    /// Domain object exposed through reflection
    Object(Arc<dyn Reflect>),
}

/// Coarse classification of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `Value::Empty`
    Empty,
    /// `Value::Boolean`
    Boolean,
    /// `Value::Number`
    Number,
    /// `Value::String`
    String,
    /// Any heap object
    Object,
}

impl Value {
    /// Name of the value's type, as shown in error messages and by `typeof`.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Empty => "Empty",
            Value::Boolean(_) => "Boolean",
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::Array(_) => "Array",
            Value::Dictionary(_) => "Dictionary",
            Value::Function(_) => "Function",
            Value::Object(obj) => obj.type_name(),
        }
    }

    /// Coarse kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Empty => ValueKind::Empty,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            _ => ValueKind::Object,
        }
    }

    /// True if both values point at the same heap object.
    ///
    /// Scalars are never identical to anything.
    pub fn is_same_object(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Dictionary(a), Value::Dictionary(b)) => Arc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => {
                Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
            }
            _ => false,
        }
    }
}
