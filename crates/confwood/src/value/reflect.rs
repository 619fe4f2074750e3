//! Reflection interface for domain objects

use super::Value;
use crate::error::FieldError;

/// Index of a field within a reflected type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(pub u32);

/// A domain object whose fields scripts can read and write.
///
/// Implementations are generated from type metadata elsewhere; the
/// evaluator only ever resolves a name to a [`FieldId`] and then reads or
/// writes through it.
pub trait Reflect: Send + Sync {
    /// Name of the object's type (`"Host"`, `"Service"`, ...).
    fn type_name(&self) -> &str;

    /// Resolve a field name.
    fn field_id(&self, name: &str) -> Option<FieldId>;

    /// Read a field.
    fn get_field(&self, id: FieldId) -> Value;

    /// Write a field.
    ///
    /// # Errors
    ///
    /// `FieldError` if the field is read-only or the value is rejected.
    fn set_field(&self, id: FieldId, value: Value) -> Result<(), FieldError>;

    /// Human readable description used for string conversion.
    fn display_name(&self) -> String {
        format!("Object of type '{}'", self.type_name())
    }
}
