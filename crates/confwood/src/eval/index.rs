//! Indexer evaluation and assignment targets
//!
//! `a[b]` and `a.b` read through [`get_field`]. Assignments resolve their
//! left-hand side to a [`Reference`] instead, creating intermediate
//! dictionaries on the way so that `a.b.c = 1` works on an empty `a`.

use std::sync::Arc;

use super::{Evaluate, ExpressionResult};
use crate::environment::prototype::{array_index, lookup_method};
use crate::environment::ScriptFrame;
use crate::error::EvalError;
use crate::expr::{Expr, ExprIndexer};
use crate::value::Value;

impl Evaluate for ExprIndexer {
    fn eval(&self, frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        let base = check_result!(self.base.evaluate(frame)?);
        let index = check_result!(self.index.evaluate(frame)?);
        Ok(get_field(&base, &index)?.into())
    }
}

/// Dictionary key for an index value.
pub(crate) fn field_name(index: &Value) -> String {
    match index {
        Value::String(s) => s.as_str().to_string(),
        other => other.to_string(),
    }
}

/// Read `base[index]`.
///
/// Dictionaries yield the entry, then a prototype method, then Empty.
/// Arrays take a numeric position or a method name. Strings only have
/// methods. Reflected objects resolve the name through their metadata.
/// Indexing Empty yields Empty.
///
/// # Errors
///
/// `TypeMismatch` for unknown fields on arrays, strings and objects and
/// for scalars; `Container` for array positions out of range.
pub fn get_field(base: &Value, index: &Value) -> Result<Value, EvalError> {
    match base {
        Value::Empty => Ok(Value::Empty),

        Value::Dictionary(dict) => {
            let name = field_name(index);
            if let Some(value) = dict.get(&name) {
                return Ok(value);
            }
            Ok(lookup_method(base, &name)
                .map(Value::Function)
                .unwrap_or_default())
        }

        Value::Array(array) => match index {
            Value::String(name) => lookup_method(base, name)
                .map(Value::Function)
                .ok_or_else(|| invalid_field(base, name)),
            position => Ok(array.get(array_index(array, position)?)?),
        },

        Value::String(_) => {
            let name = field_name(index);
            lookup_method(base, &name)
                .map(Value::Function)
                .ok_or_else(|| invalid_field(base, &name))
        }

        Value::Object(object) => {
            let name = field_name(index);
            let id = object
                .field_id(&name)
                .ok_or_else(|| invalid_field(base, &name))?;
            Ok(object.get_field(id))
        }

        Value::Boolean(_) | Value::Number(_) | Value::Function(_) => {
            Err(invalid_field(base, &field_name(index)))
        }
    }
}

/// Write `base[index] = value`.
///
/// # Errors
///
/// `Container` if the container is frozen (and `override_frozen` is not
/// set) or the array position is out of range; `Field` if a reflected
/// object rejects the write; `TypeMismatch` for anything that is not a
/// container or object.
pub fn set_field(
    base: &Value,
    index: &Value,
    value: Value,
    override_frozen: bool,
) -> Result<(), EvalError> {
    match base {
        Value::Dictionary(dict) => {
            dict.set_with(field_name(index), value, override_frozen)?;
            Ok(())
        }

        Value::Array(array) => {
            let position = array_index(array, index)?;
            array.set_with(position, value, override_frozen)?;
            Ok(())
        }

        Value::Object(object) => {
            let name = field_name(index);
            let id = object
                .field_id(&name)
                .ok_or_else(|| invalid_field(base, &name))?;
            object.set_field(id, value)?;
            Ok(())
        }

        other => Err(EvalError::type_mismatch(format!(
            "Cannot set field '{}' on a value of type '{}'",
            field_name(index),
            other.type_name()
        ))),
    }
}

fn invalid_field(base: &Value, name: &str) -> EvalError {
    EvalError::type_mismatch(format!(
        "Invalid field access (for value of type '{}'): '{}'",
        base.type_name(),
        name
    ))
}

// ═══════════════════════════════════════════════════════════════════════
// References
// ═══════════════════════════════════════════════════════════════════════

/// Assignment target.
#[derive(Debug, Clone)]
pub enum Reference {
    /// A plain variable: read through the scope chain, written to the
    /// frame's write target for the name.
    Variable(String),

    /// A field of a container or object.
    Field {
        /// Container or object holding the field
        parent: Value,
        /// Key or position
        index: Value,
    },
}

impl Reference {
    /// Current value at the target.
    pub fn get(&self, frame: &ScriptFrame<'_>) -> Result<Value, EvalError> {
        match self {
            Reference::Variable(name) => Ok(frame.get(name)),
            Reference::Field { parent, index } => get_field(parent, index),
        }
    }

    /// Store `value` at the target.
    pub fn set(
        &self,
        frame: &mut ScriptFrame<'_>,
        value: Value,
        override_frozen: bool,
    ) -> Result<(), EvalError> {
        match self {
            Reference::Variable(name) => {
                let target = frame.write_target(name);
                let index = Value::string(name.as_str());
                check_not_constant(frame, &target, &index)?;
                set_field(&target, &index, value, override_frozen)
            }
            Reference::Field { parent, index } => {
                check_not_constant(frame, parent, index)?;
                set_field(parent, index, value, override_frozen)
            }
        }
    }
}

fn check_not_constant(
    frame: &ScriptFrame<'_>,
    parent: &Value,
    index: &Value,
) -> Result<(), EvalError> {
    let ctx = frame.context();
    let Value::Dictionary(dict) = parent else {
        return Ok(());
    };
    if !Arc::ptr_eq(dict, ctx.globals()) {
        return Ok(());
    }

    let name = field_name(index);
    if ctx.constant(&name).is_some() {
        return Err(EvalError::ConstantRedefined { name, location: None });
    }
    Ok(())
}

impl Expr {
    /// Resolve this expression as an assignment target.
    ///
    /// Variables and indexers are assignable; anything else yields `None`.
    /// With `init_dict`, an Empty intermediate value on an indexer chain is
    /// replaced by a new dictionary before descending into it.
    pub fn reference(
        &self,
        frame: &mut ScriptFrame<'_>,
        init_dict: bool,
    ) -> Result<Option<Reference>, EvalError> {
        match self {
            Expr::Variable(var) => Ok(Some(Reference::Variable(var.name.clone()))),

            Expr::Indexer(indexer) => {
                let parent = match indexer.base.reference(frame, init_dict)? {
                    Some(base_ref) => {
                        let mut current = base_ref.get(frame)?;
                        if init_dict && current.is_empty() {
                            current = Value::dictionary();
                            base_ref.set(frame, current.clone(), false)?;
                        }
                        current
                    }
                    None => indexer.base.evaluate_value(frame)?,
                };
                let index = indexer.index.evaluate_value(frame)?;
                Ok(Some(Reference::Field { parent, index }))
            }

            _ => Ok(None),
        }
    }
}
