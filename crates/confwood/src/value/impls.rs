//! Value trait implementations: constructors, predicates, extractors,
//! conversions, From traits, PartialEq

use std::sync::Arc;

use super::*;
use crate::error::EvalError;

// ═══════════════════════════════════════════════════════════════════
// Convenience Constructors
// ═══════════════════════════════════════════════════════════════════

impl Value {
    /// Create a string value
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(Arc::new(s.into()))
    }

    /// Create an array value owning `items`
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Arc::new(Array::from_vec(items)))
    }

    /// Create an empty dictionary value
    pub fn dictionary() -> Self {
        Value::Dictionary(Arc::new(Dictionary::new()))
    }

    /// Create a dictionary value from key/value pairs
    pub fn dictionary_from<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Dictionary(Arc::new(pairs.into_iter().collect()))
    }

    /// Wrap a reflected domain object
    pub fn object(obj: Arc<dyn Reflect>) -> Self {
        Value::Object(obj)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Type Predicates
    // ═══════════════════════════════════════════════════════════════════

    /// Check if value is `Empty`
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Check if value is a boolean
    pub fn is_boolean(&self) -> bool {
        matches!(self, Value::Boolean(_))
    }

    /// Check if value is a number
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    /// Check if value is a string
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Check if value is any heap object
    pub fn is_object(&self) -> bool {
        self.kind() == ValueKind::Object
    }

    /// Check if value can be called
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Extractors (return Option for safe access)
    // ═══════════════════════════════════════════════════════════════════

    /// Extract boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract number value
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Extract string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Extract array handle
    pub fn as_array(&self) -> Option<&Arc<Array>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Extract dictionary handle
    pub fn as_dictionary(&self) -> Option<&Arc<Dictionary>> {
        match self {
            Value::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Extract function handle
    pub fn as_function(&self) -> Option<&Arc<Function>> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Extract reflected object handle
    pub fn as_object(&self) -> Option<&Arc<dyn Reflect>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Conversions
    // ═══════════════════════════════════════════════════════════════════

    /// Truthiness used by conditions and logical operators.
    pub fn to_bool(&self) -> bool {
        match self {
            Value::Empty => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Dictionary(d) => !d.is_empty(),
            Value::Function(_) | Value::Object(_) => true,
        }
    }

    /// Numeric conversion.
    ///
    /// # Errors
    ///
    /// Strings that do not parse as a number and heap objects.
    pub fn to_number(&self) -> Result<f64, EvalError> {
        match self {
            Value::Empty => Ok(0.0),
            Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Number(n) => Ok(*n),
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(0.0);
                }
                trimmed.parse::<f64>().map_err(|_| {
                    EvalError::operator(format!("Can't convert '{}' to a floating point number.", s))
                })
            }
            other => Err(EvalError::operator(format!(
                "The type '{}' cannot be converted to a number",
                other.type_name()
            ))),
        }
    }

    /// Numeric conversion truncated through `i64`, used by bitwise operators.
    pub(crate) fn to_integer(&self) -> Result<i64, EvalError> {
        Ok(self.to_number()? as i64)
    }
}

// ═══════════════════════════════════════════════════════════════════
// PartialEq Implementation
// ═══════════════════════════════════════════════════════════════════

impl PartialEq for Value {
    /// Equality as seen by the `==` operator.
    ///
    /// Numbers, booleans and Empty compare numerically; strings and Empty
    /// compare as strings; arrays compare element-wise; other heap values
    /// compare by identity.
    fn eq(&self, other: &Self) -> bool {
        use Value::*;

        match (self, other) {
            (Empty, Empty) => true,
            (Number(a), Number(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Boolean(a), Boolean(b)) => a == b,

            (Empty | Boolean(_) | Number(_), Empty | Boolean(_) | Number(_)) => {
                match (self.to_number(), other.to_number()) {
                    (Ok(a), Ok(b)) => a == b,
                    _ => false,
                }
            }

            (String(s), Empty) | (Empty, String(s)) => s.is_empty(),

            (Array(a), Array(b)) => a == b,

            _ => self.is_same_object(other),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// From Implementations
// ═══════════════════════════════════════════════════════════════════

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::new(s))
    }
}

impl From<Arc<String>> for Value {
    fn from(s: Arc<String>) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::new(s.to_string()))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

impl From<Array> for Value {
    fn from(array: Array) -> Self {
        Value::Array(Arc::new(array))
    }
}

impl From<Arc<Array>> for Value {
    fn from(array: Arc<Array>) -> Self {
        Value::Array(array)
    }
}

impl From<Dictionary> for Value {
    fn from(dict: Dictionary) -> Self {
        Value::Dictionary(Arc::new(dict))
    }
}

impl From<Arc<Dictionary>> for Value {
    fn from(dict: Arc<Dictionary>) -> Self {
        Value::Dictionary(dict)
    }
}

impl From<Function> for Value {
    fn from(func: Function) -> Self {
        Value::Function(Arc::new(func))
    }
}

impl From<Arc<Function>> for Value {
    fn from(func: Arc<Function>) -> Self {
        Value::Function(func)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Empty, Into::into)
    }
}
