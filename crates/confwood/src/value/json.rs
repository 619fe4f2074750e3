//! JSON interop for values

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use super::*;
use crate::container::PARENT_KEY;
use crate::error::EvalError;

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Empty => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(array) => {
                let Some(_guard) = CycleGuard::enter(array.as_ref()) else {
                    return Err(serde::ser::Error::custom("cannot encode an Array that contains itself"));
                };
                let items = array.to_vec();
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in &items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Dictionary(dict) => {
                let Some(_guard) = CycleGuard::enter(dict.as_ref()) else {
                    return Err(serde::ser::Error::custom(
                        "cannot encode a Dictionary that contains itself",
                    ));
                };
                let entries: Vec<_> = dict
                    .entries()
                    .into_iter()
                    .filter(|(key, _)| key != PARENT_KEY)
                    .collect();
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in &entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Value::Function(_) | Value::Object(_) => serializer.serialize_str(&self.to_string()),
        }
    }
}

impl Value {
    /// Build a value from parsed JSON. Objects become dictionaries, keeping
    /// key order.
    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Empty,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::from(s),
            serde_json::Value::Array(items) => {
                Value::array(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::dictionary_from(
                map.into_iter().map(|(key, value)| (key, Value::from_json(value))),
            ),
        }
    }

    /// Parse a JSON document.
    pub fn from_json_str(text: &str) -> Result<Value, EvalError> {
        serde_json::from_str::<serde_json::Value>(text)
            .map(Value::from_json)
            .map_err(|e| EvalError::operator(format!("Invalid JSON: {e}")))
    }

    /// Encode as compact JSON.
    pub fn to_json_string(&self) -> Result<String, EvalError> {
        serde_json::to_string(self)
            .map_err(|e| EvalError::operator(format!("Cannot encode value as JSON: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encode_nested() {
        let value = Value::dictionary_from([
            ("name", Value::from("web1")),
            ("ports", Value::array(vec![Value::from(80), Value::from(443)])),
            ("ratio", Value::from(0.5)),
            ("notes", Value::Empty),
        ]);
        assert_eq!(
            value.to_json_string().unwrap(),
            r#"{"name":"web1","ports":[80,443],"ratio":0.5,"notes":null}"#
        );
    }

    #[test]
    fn test_decode_keeps_key_order() {
        let value = Value::from_json_str(r#"{"z": 1, "a": [true, null]}"#).unwrap();
        let dict = value.as_dictionary().unwrap();
        assert_eq!(dict.keys(), vec!["z".to_string(), "a".to_string()]);

        let array = dict.get("a").unwrap();
        let array = array.as_array().unwrap();
        assert_eq!(array.get(0).unwrap(), Value::from(true));
        assert!(array.get(1).unwrap().is_empty());
    }

    #[test]
    fn test_decode_invalid() {
        assert!(Value::from_json_str("{").is_err());
    }

    #[test]
    fn test_scope_parent_is_not_encoded() {
        let root = std::sync::Arc::new(Dictionary::new());
        let child = Dictionary::child_of(&root);
        child.set("x", Value::from(1)).unwrap();
        assert_eq!(
            Value::Dictionary(child).to_json_string().unwrap(),
            r#"{"x":1}"#
        );
    }
}
