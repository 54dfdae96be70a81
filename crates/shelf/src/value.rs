//! Leaf values stored in a shelf.

use std::cmp::Ordering;
use std::hash::Hash;
use std::hash::Hasher;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value as Json;

use crate::error::Result;
use crate::error::ShelfError;

/// A leaf value. Values of different kinds are ordered by kind:
/// array > string > int > float > bool > null.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Float(f64),
    Int(i64),
    String(String),
    Array(Vec<Value>),
}

impl Value {
    #[inline]
    fn rank(&self) -> u8 {
        return match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Float(_) => 2,
            Value::Int(_) => 3,
            Value::String(_) => 4,
            Value::Array(_) => 5,
        };
    }

    /// Convert a JSON leaf. Objects are rejected; they become shelf maps.
    pub fn from_json(json: &Json) -> Result<Value> {
        let value = match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::String(s.clone()),
            Json::Array(items) => {
                let items: Result<Vec<Value>> = items.iter().map(Value::from_json).collect();
                Value::Array(items?)
            }
            Json::Object(_) => return Err(ShelfError::ObjectInArray),
        };
        return Ok(value);
    }

    pub fn to_json(&self) -> Json {
        return match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Float(f) => serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number),
            Value::Int(i) => Json::from(*i),
            Value::String(s) => Json::String(s.clone()),
            Value::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
        };
    }
}

/// Floats hash by bit pattern, so `0.0` and `-0.0` stamp differently.
impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Int(i) => i.hash(state),
            Value::String(s) => s.hash(state),
            Value::Array(items) => items.hash(state),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        return match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            (Value::Array(a), Value::Array(b)) => a.partial_cmp(b),
            _ => self.rank().partial_cmp(&other.rank()),
        };
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn kinds_are_ranked() {
        let string = Value::from_json(&json!("a")).unwrap();
        let int = Value::from_json(&json!(99)).unwrap();
        let array = Value::from_json(&json!([1])).unwrap();

        assert!(string > int);
        assert!(array > string);
        assert!(Value::Bool(true) > Value::Null);
    }

    #[test]
    fn nan_does_not_compare() {
        assert_eq!(Value::Float(f64::NAN).partial_cmp(&Value::Float(1.0)), None);
    }

    #[test]
    fn objects_are_not_leaves() {
        assert!(Value::from_json(&json!({"a": 1})).is_err());
        assert!(Value::from_json(&json!([{"a": 1}])).is_err());
    }

    #[test]
    fn json_conversion_keeps_shape() {
        let json = json!([1, "two", [false, null]]);
        assert_eq!(Value::from_json(&json).unwrap().to_json(), json);
    }
}
