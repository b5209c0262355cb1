//! Runtime values exchanged with candidate code.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{ContainerId, InstanceId};
use crate::type_name::TypeName;

/// Reference to a live instance owned by one container.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub container: ContainerId,
    pub instance: InstanceId,
    pub type_name: TypeName,
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}#{}", self.type_name, self.instance)
    }
}

/// A value passed into or returned from a candidate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Str(String),
    Array(Vec<Value>),
    Object(ObjectRef),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Char(c) => Some(*c as i64),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Runtime type of the value.
    pub fn type_name(&self) -> TypeName {
        match self {
            Value::Null => TypeName::new("null"),
            Value::Bool(_) => TypeName::new("boolean"),
            Value::Int(_) => TypeName::new("long"),
            Value::Float(_) => TypeName::new("double"),
            Value::Char(_) => TypeName::new("char"),
            Value::Str(_) => TypeName::new("String"),
            Value::Array(_) => TypeName::new("Object[]"),
            Value::Object(o) => o.type_name.clone(),
        }
    }

    /// JSON rendering used by actuation sheets. Object references render as
    /// `"@Type#id"`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(f.to_string())),
            Value::Char(c) => serde_json::Value::String(c.to_string()),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(o) => serde_json::Value::String(o.to_string()),
        }
    }

    /// Untyped decoding of a JSON document. Integral numbers become `Int`,
    /// other numbers `Float`; objects are kept as their JSON text.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(_) => Value::Str(json.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj() -> ObjectRef {
        ObjectRef {
            container: ContainerId::from("c1"),
            instance: InstanceId(7),
            type_name: TypeName::new("ArrayStack"),
        }
    }

    #[test]
    fn object_renders_as_handle() {
        let v = Value::Object(obj());
        assert_eq!(v.to_json(), serde_json::json!("@ArrayStack#7"));
        assert_eq!(v.type_name().as_str(), "ArrayStack");
    }

    #[test]
    fn json_decoding_is_untyped() {
        let v = Value::from_json(&serde_json::json!([1, 2.5, "x", null, true]));
        assert_eq!(
            v,
            Value::Array(vec![
                Value::Int(1),
                Value::Float(2.5),
                Value::Str("x".into()),
                Value::Null,
                Value::Bool(true),
            ])
        );
    }

    #[test]
    fn accessors() {
        assert_eq!(Value::Int(3).as_float(), Some(3.0));
        assert_eq!(Value::Char('a').as_int(), Some(97));
        assert_eq!(Value::from("hi").as_str(), Some("hi"));
        assert!(Value::Null.is_null());
        assert!(Value::Object(obj()).as_object().is_some());
    }

    #[test]
    fn non_finite_float_renders_as_string() {
        assert_eq!(Value::Float(f64::INFINITY).to_json(), serde_json::json!("inf"));
    }

    #[test]
    fn serde_roundtrip_tagged() {
        let v = Value::Array(vec![Value::Int(1), Value::Object(obj())]);
        let text = serde_json::to_string(&v).unwrap();
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v, back);
    }
}
