//! Abstract interface specifications.
//!
//! An [`InterfaceSpecification`] is the behavioural contract every candidate is
//! adapted to. It is immutable once built and shared read-only by the
//! adaptation engine and the SSN resolver.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{SpecError, SpecResult};
use crate::type_name::TypeName;

/// One operation of an interface specification.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodSignature {
    pub name: String,
    pub input_types: Vec<TypeName>,
    /// Empty, or a single `void`, means the method yields nothing.
    pub output_types: Vec<TypeName>,
    #[serde(default)]
    pub is_constructor: bool,
}

impl MethodSignature {
    pub fn new<I, O>(name: impl Into<String>, inputs: I, outputs: O) -> Self
    where
        I: IntoIterator,
        I::Item: Into<TypeName>,
        O: IntoIterator,
        O::Item: Into<TypeName>,
    {
        Self {
            name: name.into(),
            input_types: inputs.into_iter().map(Into::into).collect(),
            output_types: outputs.into_iter().map(Into::into).collect(),
            is_constructor: false,
        }
    }

    pub fn constructor<I>(name: impl Into<String>, inputs: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<TypeName>,
    {
        let name = name.into();
        Self {
            output_types: vec![TypeName::new(&name)],
            name,
            input_types: inputs.into_iter().map(Into::into).collect(),
            is_constructor: true,
        }
    }

    pub fn arity(&self) -> usize {
        self.input_types.len()
    }

    /// The single result type, `void` when there is none.
    pub fn return_type(&self) -> TypeName {
        self.output_types
            .first()
            .cloned()
            .unwrap_or_else(TypeName::void)
    }

    /// `name(T1,T2)` rendering used in logs and errors.
    pub fn display_signature(&self) -> String {
        let params: Vec<&str> = self.input_types.iter().map(TypeName::as_str).collect();
        format!("{}({})", self.name, params.join(","))
    }
}

/// A named, ordered set of method signatures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceSpecification {
    name: String,
    methods: Vec<MethodSignature>,
}

impl InterfaceSpecification {
    /// Build a specification. Methods named like the specification itself are
    /// marked as constructors.
    pub fn new(name: impl Into<String>, methods: Vec<MethodSignature>) -> SpecResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SpecError::BlankSpecName);
        }

        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(methods.len());
        for (index, mut method) in methods.into_iter().enumerate() {
            if method.name.trim().is_empty() {
                return Err(SpecError::BlankMethodName {
                    spec: name.clone(),
                    index,
                });
            }
            if method.name == name {
                method.is_constructor = true;
            }
            let signature = method.display_signature();
            if !seen.insert(signature.clone()) {
                return Err(SpecError::DuplicateSignature {
                    spec: name.clone(),
                    signature,
                });
            }
            normalized.push(method);
        }

        Ok(Self {
            name,
            methods: normalized,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn methods(&self) -> &[MethodSignature] {
        &self.methods
    }

    pub fn method(&self, index: usize) -> Option<&MethodSignature> {
        self.methods.get(index)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Locate a non-constructor method by name and arity.
    pub fn find_method(&self, name: &str, arity: usize) -> Option<(usize, &MethodSignature)> {
        self.methods
            .iter()
            .enumerate()
            .find(|(_, m)| !m.is_constructor && m.name == name && m.arity() == arity)
    }

    /// Locate a declared constructor by arity.
    pub fn find_constructor(&self, arity: usize) -> Option<(usize, &MethodSignature)> {
        self.methods
            .iter()
            .enumerate()
            .find(|(_, m)| m.is_constructor && m.arity() == arity)
    }

    /// Whether a member named `name` with at least one parameter is declared.
    pub fn declares_with_arguments(&self, name: &str) -> bool {
        self.methods
            .iter()
            .any(|m| m.name == name && m.arity() > 0)
    }
}
