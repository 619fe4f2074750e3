//! Operator semantics for values
//!
//! Operators never mutate their operands. Container results (`+` on arrays
//! or dictionaries, `-` on arrays) are always fresh containers.

use std::cmp::Ordering;

use super::*;
use crate::error::{EvalError, Result};

/// Number or Empty, but not both sides Empty.
fn numeric_pair(lhs: &Value, rhs: &Value) -> bool {
    matches!(lhs, Value::Number(_) | Value::Empty)
        && matches!(rhs, Value::Number(_) | Value::Empty)
        && !(lhs.is_empty() && rhs.is_empty())
}

/// Position of a value's kind in cross-kind comparisons. Empty shares the
/// numeric rank.
fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Boolean(_) => 0,
        Value::Empty | Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Array(_) => 3,
        Value::Dictionary(_) => 4,
        Value::Function(_) => 5,
        Value::Object(_) => 6,
    }
}

fn numeric_cmp(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
    }
}

fn string_pair(lhs: &Value, rhs: &Value) -> bool {
    matches!(lhs, Value::String(_) | Value::Number(_) | Value::Empty)
        && matches!(rhs, Value::String(_) | Value::Number(_) | Value::Empty)
        && !(lhs.is_empty() && rhs.is_empty())
}

impl Value {
    // ═══════════════════════════════════════════════════════════════════
    // Arithmetic
    // ═══════════════════════════════════════════════════════════════════

    /// `lhs + rhs`: numeric addition, string concatenation, array
    /// concatenation or dictionary merge depending on the operand kinds.
    pub fn plus(&self, rhs: &Value) -> Result<Value> {
        if numeric_pair(self, rhs) {
            return Ok(Value::Number(self.to_number()? + rhs.to_number()?));
        }

        if string_pair(self, rhs) {
            return Ok(Value::string(format!("{self}{rhs}")));
        }

        match (self, rhs) {
            (Value::Empty, Value::Empty) => {
                Err(EvalError::binary_operator("+", self.type_name(), rhs.type_name()))
            }
            (Value::Array(_) | Value::Empty, Value::Array(_) | Value::Empty) => {
                let result = Array::new();
                for side in [self, rhs] {
                    if let Value::Array(array) = side {
                        array.copy_to(&result)?;
                    }
                }
                Ok(Value::from(result))
            }
            (Value::Dictionary(_) | Value::Empty, Value::Dictionary(_) | Value::Empty) => {
                let result = Dictionary::new();
                for side in [self, rhs] {
                    if let Value::Dictionary(dict) = side {
                        dict.copy_to(&result)?;
                    }
                }
                Ok(Value::from(result))
            }
            _ => Err(EvalError::binary_operator("+", self.type_name(), rhs.type_name())),
        }
    }

    /// `lhs - rhs`: numeric subtraction or array difference.
    pub fn minus(&self, rhs: &Value) -> Result<Value> {
        if numeric_pair(self, rhs) {
            return Ok(Value::Number(self.to_number()? - rhs.to_number()?));
        }

        match (self, rhs) {
            (Value::Empty, Value::Array(_)) => Ok(Value::array(Vec::new())),
            (Value::Array(left), Value::Array(_) | Value::Empty) => {
                let right = rhs.as_array().map(|a| a.to_vec()).unwrap_or_default();
                let remaining = left
                    .to_vec()
                    .into_iter()
                    .filter(|item| !right.contains(item))
                    .collect();
                Ok(Value::array(remaining))
            }
            _ => Err(EvalError::binary_operator("-", self.type_name(), rhs.type_name())),
        }
    }

    /// `lhs * rhs`
    pub fn times(&self, rhs: &Value) -> Result<Value> {
        if numeric_pair(self, rhs) {
            return Ok(Value::Number(self.to_number()? * rhs.to_number()?));
        }
        Err(EvalError::binary_operator("*", self.type_name(), rhs.type_name()))
    }

    /// `lhs / rhs`
    pub fn divided_by(&self, rhs: &Value) -> Result<Value> {
        let divisor = self.checked_divisor("/", rhs)?;
        Ok(Value::Number(self.to_number()? / divisor))
    }

    /// `lhs % rhs` (floating-point remainder)
    pub fn modulo(&self, rhs: &Value) -> Result<Value> {
        let divisor = self.checked_divisor("%", rhs)?;
        Ok(Value::Number(self.to_number()? % divisor))
    }

    fn checked_divisor(&self, op: &str, rhs: &Value) -> Result<f64> {
        match (self, rhs) {
            (_, Value::Empty) => Err(EvalError::operator(format!(
                "Right-hand side argument for operator {op} is Empty."
            ))),
            (Value::Number(_) | Value::Empty, Value::Number(divisor)) => {
                if *divisor == 0.0 {
                    return Err(EvalError::operator(format!(
                        "Right-hand side argument for operator {op} is 0."
                    )));
                }
                Ok(*divisor)
            }
            _ => Err(EvalError::binary_operator(op, self.type_name(), rhs.type_name())),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Bitwise (through i64)
    // ═══════════════════════════════════════════════════════════════════

    fn integer_op(&self, op: &str, rhs: &Value, f: impl Fn(i64, i64) -> i64) -> Result<Value> {
        if numeric_pair(self, rhs) {
            return Ok(Value::Number(f(self.to_integer()?, rhs.to_integer()?) as f64));
        }
        Err(EvalError::binary_operator(op, self.type_name(), rhs.type_name()))
    }

    /// `lhs & rhs`
    pub fn bit_and(&self, rhs: &Value) -> Result<Value> {
        self.integer_op("&", rhs, |a, b| a & b)
    }

    /// `lhs | rhs`
    pub fn bit_or(&self, rhs: &Value) -> Result<Value> {
        self.integer_op("|", rhs, |a, b| a | b)
    }

    /// `lhs ^ rhs`
    pub fn bit_xor(&self, rhs: &Value) -> Result<Value> {
        self.integer_op("^", rhs, |a, b| a ^ b)
    }

    /// `lhs << rhs`; shift amounts wrap at 64.
    pub fn shift_left(&self, rhs: &Value) -> Result<Value> {
        self.integer_op("<<", rhs, |a, b| a.wrapping_shl(b as u32))
    }

    /// `lhs >> rhs`; shift amounts wrap at 64.
    pub fn shift_right(&self, rhs: &Value) -> Result<Value> {
        self.integer_op(">>", rhs, |a, b| a.wrapping_shr(b as u32))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Unary
    // ═══════════════════════════════════════════════════════════════════

    /// `-value`
    pub fn negate(&self) -> Result<Value> {
        match self {
            Value::Number(_) | Value::Boolean(_) | Value::Empty => {
                Ok(Value::Number(-self.to_number()?))
            }
            _ => Err(EvalError::operator(format!(
                "Operator - cannot be applied to a value of type '{}'",
                self.type_name()
            ))),
        }
    }

    /// `~value`
    pub fn bit_not(&self) -> Result<Value> {
        match self {
            Value::Number(_) | Value::Boolean(_) | Value::Empty => {
                Ok(Value::Number(!self.to_integer()? as f64))
            }
            _ => Err(EvalError::operator(format!(
                "Operator ~ cannot be applied to a value of type '{}'",
                self.type_name()
            ))),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Comparison
    // ═══════════════════════════════════════════════════════════════════

    /// Ordering used by relational operators and `sort`.
    ///
    /// Numbers and Empty compare numerically, with NaN above every other
    /// number. Strings compare lexicographically. Values of different kinds
    /// order by a fixed kind rank, objects of different types by type name.
    /// Two values of the same non-comparable kind are an error.
    pub fn try_cmp(&self, rhs: &Value) -> Result<Ordering> {
        self.compare("<=>", rhs)
    }

    fn compare(&self, op: &str, rhs: &Value) -> Result<Ordering> {
        match (self, rhs) {
            (Value::String(a), Value::String(b)) => return Ok(a.cmp(b)),
            (Value::Number(_) | Value::Empty, Value::Number(_) | Value::Empty) => {
                return Ok(numeric_cmp(self.to_number()?, rhs.to_number()?));
            }
            _ => {}
        }

        let (left, right) = (kind_rank(self), kind_rank(rhs));
        if left != right {
            return Ok(left.cmp(&right));
        }
        if let (Value::Object(a), Value::Object(b)) = (self, rhs) {
            if a.type_name() != b.type_name() {
                return Ok(a.type_name().cmp(b.type_name()));
            }
        }

        Err(EvalError::binary_operator(op, self.type_name(), rhs.type_name()))
    }

    /// `lhs < rhs`
    pub fn less_than(&self, rhs: &Value) -> Result<bool> {
        Ok(self.compare("<", rhs)? == Ordering::Less)
    }

    /// `lhs > rhs`
    pub fn greater_than(&self, rhs: &Value) -> Result<bool> {
        Ok(self.compare(">", rhs)? == Ordering::Greater)
    }

    /// `lhs <= rhs`
    pub fn less_or_equal(&self, rhs: &Value) -> Result<bool> {
        Ok(self.compare("<=", rhs)? != Ordering::Greater)
    }

    /// `lhs >= rhs`
    pub fn greater_or_equal(&self, rhs: &Value) -> Result<bool> {
        Ok(self.compare(">=", rhs)? != Ordering::Less)
    }

    /// `self in container`
    ///
    /// # Errors
    ///
    /// `TypeMismatch` unless `container` is an Array or Empty.
    pub fn contained_in(&self, container: &Value) -> Result<bool> {
        match container {
            Value::Empty => Ok(false),
            Value::Array(array) => Ok(array.contains(self)),
            other => Err(EvalError::type_mismatch(format!(
                "Invalid right side argument for 'in' operator: {}",
                other.type_name()
            ))),
        }
    }
}
