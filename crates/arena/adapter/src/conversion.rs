//! Type conversions between specification and candidate types.
//!
//! A binding whose types are not identical survives only if every mismatched
//! position has a [`Converter`]. Parameters convert from the specification
//! type to the member type, results from the member type back to the
//! specification type.

use std::fmt;
use std::sync::Arc;

use arena_container::Fault;
use arena_types::{TypeName, Value};

type ConvertFn = Arc<dyn Fn(&Value) -> Result<Value, Fault> + Send + Sync>;

/// A conversion from one type to another.
#[derive(Clone)]
pub struct Converter {
    from: TypeName,
    to: TypeName,
    apply: ConvertFn,
}

impl Converter {
    pub fn new<F>(from: TypeName, to: TypeName, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        Self {
            from,
            to,
            apply: Arc::new(f),
        }
    }

    pub fn from_type(&self) -> &TypeName {
        &self.from
    }

    pub fn to_type(&self) -> &TypeName {
        &self.to
    }

    pub fn convert(&self, value: &Value) -> Result<Value, Fault> {
        (self.apply)(value)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Converter({} -> {})", self.from, self.to)
    }
}

/// Pluggable conversion lookup.
pub trait TypeConversions: Send + Sync {
    /// A converter from `from` to `to`, if the two are convertible. Never
    /// called with identical types.
    fn find(&self, from: &TypeName, to: &TypeName) -> Option<Converter>;
}

/// Only identical types bind.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoConversions;

impl TypeConversions for NoConversions {
    fn find(&self, _from: &TypeName, _to: &TypeName) -> Option<Converter> {
        None
    }
}

/// Numeric widening, boxing and unboxing, widening to `Object` and discarding
/// a result the specification declares `void`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardConversions;

impl TypeConversions for StandardConversions {
    fn find(&self, from: &TypeName, to: &TypeName) -> Option<Converter> {
        if from == to {
            return None;
        }
        if to.is_void() {
            return Some(Converter::new(from.clone(), to.clone(), |_| Ok(Value::Null)));
        }
        if from.is_void() {
            return None;
        }
        if to.is_object() {
            return Some(Converter::new(from.clone(), to.clone(), |v| Ok(v.clone())));
        }

        let from_prim = primitive_of(from)?;
        let to_prim = primitive_of(to)?;
        // same primitive means pure boxing or unboxing
        if from_prim == to_prim || widens(from_prim, to_prim) {
            return Some(numeric_converter(from, to, to_prim));
        }
        None
    }
}

fn numeric_converter(from: &TypeName, to: &TypeName, target: &'static str) -> Converter {
    let source = from.clone();
    let to_primitive = to.is_primitive();
    Converter::new(from.clone(), to.clone(), move |value| {
        if value.is_null() {
            return if to_primitive {
                Err(Fault::thrown(
                    "NullPointerException",
                    format!("cannot unbox null {}", source),
                ))
            } else {
                Ok(Value::Null)
            };
        }
        coerce(value, target)
    })
}

fn coerce(value: &Value, target: &str) -> Result<Value, Fault> {
    let mismatch = || Fault::conversion(format!("cannot convert {} to {}", value, target));
    match target {
        "boolean" => value.as_bool().map(Value::Bool).ok_or_else(mismatch),
        "char" => match value {
            Value::Char(c) => Ok(Value::Char(*c)),
            _ => Err(mismatch()),
        },
        "float" | "double" => value.as_float().map(Value::Float).ok_or_else(mismatch),
        _ => value.as_int().map(Value::Int).ok_or_else(mismatch),
    }
}

/// Primitive counterpart of a primitive or boxed type.
fn primitive_of(ty: &TypeName) -> Option<&'static str> {
    let prim = match ty.as_str() {
        "boolean" | "Boolean" => "boolean",
        "byte" | "Byte" => "byte",
        "short" | "Short" => "short",
        "char" | "Character" => "char",
        "int" | "Integer" => "int",
        "long" | "Long" => "long",
        "float" | "Float" => "float",
        "double" | "Double" => "double",
        _ => return None,
    };
    Some(prim)
}

fn numeric_rank(prim: &str) -> Option<u8> {
    match prim {
        "byte" => Some(1),
        "short" => Some(2),
        "int" => Some(3),
        "long" => Some(4),
        "float" => Some(5),
        "double" => Some(6),
        _ => None,
    }
}

/// Widening primitive conversion.
fn widens(from: &str, to: &str) -> bool {
    if from == "char" {
        return matches!(to, "int" | "long" | "float" | "double");
    }
    match (numeric_rank(from), numeric_rank(to)) {
        (Some(a), Some(b)) => a < b,
        _ => false,
    }
}
