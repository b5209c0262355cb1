//! Literal decoding, built-in value types and the expected-value oracle.

use arena_container::Fault;
use arena_types::{TypeName, Value};

/// Decode a JSON literal, guided by the declared type when there is one.
///
/// Strings wrapped in single quotes lose the quotes. A one-character string
/// becomes a `Char` when a `char` is expected. Numbers become `Float` for
/// floating types and `Int` whenever they are integral otherwise.
pub fn decode_literal(json: &serde_json::Value, expected: Option<&TypeName>) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            let floating = expected.is_some_and(TypeName::is_floating);
            match n.as_i64() {
                Some(i) if !floating => Value::Int(i),
                _ => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            }
        }
        serde_json::Value::String(s) => {
            let text = unquote(s);
            if expected.is_some_and(TypeName::is_char) {
                let mut chars = text.chars();
                if let (Some(c), None) = (chars.next(), chars.next()) {
                    return Value::Char(c);
                }
            }
            Value::Str(text.to_string())
        }
        serde_json::Value::Array(items) => {
            let element = expected.and_then(TypeName::element_type);
            Value::Array(
                items
                    .iter()
                    .map(|item| decode_literal(item, element.as_ref()))
                    .collect(),
            )
        }
        serde_json::Value::Object(_) => Value::Str(json.to_string()),
    }
}

/// `'text'` → `text`; anything else unchanged.
pub fn unquote(s: &str) -> &str {
    if s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

/// Types a sheet may create without a candidate.
pub fn is_builtin(ty: &TypeName) -> bool {
    ty.is_string()
        || ty.is_integral()
        || ty.is_floating()
        || ty.is_boolean()
        || ty.is_char()
        || ty.is_object()
        || ty.element_type().is_some_and(|e| !e.as_str().is_empty())
}

/// Declared type of constructor argument `position` of a built-in type.
pub fn builtin_input_type(ty: &TypeName, position: usize) -> Option<TypeName> {
    if ty.is_array() {
        return (position == 0).then(|| TypeName::new("int"));
    }
    if ty.is_object() {
        return None;
    }
    (position == 0).then(|| ty.clone())
}

/// Largest array a sheet may create as a built-in value.
pub const MAX_ARRAY_LENGTH: usize = 1 << 20;

/// Create a value of a built-in type. `token` identifies plain `Object`
/// instances, which have no state beyond their identity.
pub fn create_builtin(ty: &TypeName, args: &[Value], token: &str) -> Result<Value, Fault> {
    let first = args.first();
    if let Some(element) = ty.element_type() {
        let len = match first {
            Some(v) => v
                .as_int()
                .filter(|n| *n >= 0)
                .ok_or_else(|| Fault::thrown("NegativeArraySizeException", v.to_string()))?,
            None => 0,
        };
        let len = usize::try_from(len)
            .ok()
            .filter(|n| *n <= MAX_ARRAY_LENGTH)
            .ok_or_else(|| {
                Fault::thrown(
                    "OutOfMemoryError",
                    format!("array size {} exceeds the limit of {}", len, MAX_ARRAY_LENGTH),
                )
            })?;
        let mut items = Vec::new();
        items
            .try_reserve_exact(len)
            .map_err(|e| Fault::thrown("OutOfMemoryError", e.to_string()))?;
        items.resize(len, default_of(&element));
        return Ok(Value::Array(items));
    }
    if ty.is_object() {
        return Ok(Value::Str(format!("Object@{}", token)));
    }
    if ty.is_string() {
        return Ok(Value::Str(match first {
            None | Some(Value::Null) => String::new(),
            Some(Value::Str(s)) => s.clone(),
            Some(Value::Char(c)) => c.to_string(),
            Some(other) => other.to_string(),
        }));
    }

    let Some(arg) = first else {
        return Ok(default_of(ty));
    };
    let invalid = || Fault::thrown("NumberFormatException", format!("{} for {}", arg, ty));
    if ty.is_integral() {
        match arg {
            Value::Str(s) => s.trim().parse().map(Value::Int).map_err(|_| invalid()),
            other => other.as_int().map(Value::Int).ok_or_else(invalid),
        }
    } else if ty.is_floating() {
        match arg {
            Value::Str(s) => s.trim().parse().map(Value::Float).map_err(|_| invalid()),
            other => other.as_float().map(Value::Float).ok_or_else(invalid),
        }
    } else if ty.is_boolean() {
        match arg {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::Str(s) => Ok(Value::Bool(s.eq_ignore_ascii_case("true"))),
            _ => Err(invalid()),
        }
    } else if ty.is_char() {
        match arg {
            Value::Char(c) => Ok(Value::Char(*c)),
            Value::Str(s) if s.chars().count() == 1 => s.chars().next().map(Value::Char).ok_or_else(invalid),
            Value::Int(i) => u32::try_from(*i)
                .ok()
                .and_then(char::from_u32)
                .map(Value::Char)
                .ok_or_else(invalid),
            _ => Err(invalid()),
        }
    } else {
        Err(Fault::dispatch(format!("{} is not a built-in type", ty)))
    }
}

/// Zero value of a type.
pub fn default_of(ty: &TypeName) -> Value {
    match ty.as_str() {
        "byte" | "short" | "int" | "long" => Value::Int(0),
        "float" | "double" => Value::Float(0.0),
        "boolean" => Value::Bool(false),
        "char" => Value::Char('\0'),
        _ => Value::Null,
    }
}

/// Oracle comparison of an observed value with the expected literal of a
/// row. Numbers compare numerically, quoted strings without their quotes,
/// object references by their rendering.
pub fn expected_matches(expected: &serde_json::Value, observed: &Value) -> bool {
    match (expected, observed) {
        (serde_json::Value::Number(n), observed) => match (n.as_f64(), observed.as_float()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
        (serde_json::Value::String(s), Value::Char(c)) => {
            let text = unquote(s);
            text.chars().count() == 1 && text.starts_with(*c)
        }
        (serde_json::Value::String(s), Value::Str(o)) => unquote(s) == o,
        (serde_json::Value::String(s), Value::Object(o)) => *s == o.to_string(),
        (serde_json::Value::Array(items), Value::Array(values)) => {
            items.len() == values.len()
                && items
                    .iter()
                    .zip(values)
                    .all(|(e, v)| expected_matches(e, v))
        }
        (expected, observed) => *expected == observed.to_json(),
    }
}
