//! Textual type names with light normalisation.

use serde::{Deserialize, Serialize};
use std::fmt;

const VOID: &str = "void";
const LANG_PREFIX: &str = "java.lang.";

const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "short", "char", "int", "long", "float", "double",
];

/// A type name as written in an interface specification or exposed by a
/// candidate member.
///
/// Names are trimmed; an empty name means `void`; well known `java.lang.`
/// types lose their package prefix so `java.lang.String` and `String` compare
/// equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TypeName(String);

impl TypeName {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(normalize(raw.as_ref()))
    }

    pub fn void() -> Self {
        Self(VOID.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_void(&self) -> bool {
        self.0 == VOID
    }

    pub fn is_primitive(&self) -> bool {
        PRIMITIVES.contains(&self.0.as_str())
    }

    pub fn is_array(&self) -> bool {
        self.0.ends_with("[]")
    }

    /// Element type of an array type (`int[]` → `int`).
    pub fn element_type(&self) -> Option<TypeName> {
        self.0
            .strip_suffix("[]")
            .map(|inner| TypeName(inner.to_string()))
    }

    /// The catch-all reference type.
    pub fn is_object(&self) -> bool {
        self.0 == "Object"
    }

    /// Integral types, primitive or boxed.
    pub fn is_integral(&self) -> bool {
        matches!(
            self.0.as_str(),
            "byte" | "short" | "int" | "long" | "Byte" | "Short" | "Integer" | "Long"
        )
    }

    /// Floating point types, primitive or boxed.
    pub fn is_floating(&self) -> bool {
        matches!(self.0.as_str(), "float" | "double" | "Float" | "Double")
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self.0.as_str(), "boolean" | "Boolean")
    }

    pub fn is_char(&self) -> bool {
        matches!(self.0.as_str(), "char" | "Character")
    }

    pub fn is_string(&self) -> bool {
        matches!(self.0.as_str(), "String" | "CharSequence")
    }
}

fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return VOID.to_string();
    }
    match trimmed.strip_prefix(LANG_PREFIX) {
        // java.lang.reflect.Method keeps its package, java.lang.String does not
        Some(rest) if !rest.contains('.') => rest.to_string(),
        _ => trimmed.to_string(),
    }
}

impl From<String> for TypeName {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for TypeName {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<TypeName> for String {
    fn from(name: TypeName) -> Self {
        name.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
