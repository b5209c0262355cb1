//! Members exposed by candidate code units.

use serde::{Deserialize, Serialize};

use crate::type_name::TypeName;

/// Whether a member is a constructor or an ordinary method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MemberKind {
    Constructor,
    Method,
}

/// Position of a member within its code unit, unique per unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberId {
    pub kind: MemberKind,
    pub index: usize,
}

impl MemberId {
    pub fn constructor(index: usize) -> Self {
        Self {
            kind: MemberKind::Constructor,
            index,
        }
    }

    pub fn method(index: usize) -> Self {
        Self {
            kind: MemberKind::Method,
            index,
        }
    }
}

/// A constructor or method of a candidate code unit.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateMember {
    pub name: String,
    pub param_types: Vec<TypeName>,
    pub return_type: TypeName,
    pub is_constructor: bool,
}

impl CandidateMember {
    pub fn method<I>(name: impl Into<String>, params: I, return_type: impl Into<TypeName>) -> Self
    where
        I: IntoIterator,
        I::Item: Into<TypeName>,
    {
        Self {
            name: name.into(),
            param_types: params.into_iter().map(Into::into).collect(),
            return_type: return_type.into(),
            is_constructor: false,
        }
    }

    /// A constructor of `class`; it returns the class type.
    pub fn constructor<I>(class: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<TypeName>,
    {
        let name = class.into();
        Self {
            return_type: TypeName::new(&name),
            name,
            param_types: params.into_iter().map(Into::into).collect(),
            is_constructor: true,
        }
    }

    pub fn arity(&self) -> usize {
        self.param_types.len()
    }

    pub fn kind(&self) -> MemberKind {
        if self.is_constructor {
            MemberKind::Constructor
        } else {
            MemberKind::Method
        }
    }

    /// Same name, kind and parameter types.
    pub fn same_signature(&self, other: &CandidateMember) -> bool {
        self.is_constructor == other.is_constructor
            && self.name == other.name
            && self.param_types == other.param_types
    }

    pub fn display_signature(&self) -> String {
        let params: Vec<&str> = self.param_types.iter().map(TypeName::as_str).collect();
        format!("{}({}) -> {}", self.name, params.join(","), self.return_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_returns_class() {
        let ctor = CandidateMember::constructor("ArrayStack", Vec::<TypeName>::new());
        assert!(ctor.is_constructor);
        assert_eq!(ctor.kind(), MemberKind::Constructor);
        assert_eq!(ctor.return_type.as_str(), "ArrayStack");
        assert_eq!(ctor.arity(), 0);
    }

    #[test]
    fn same_signature_ignores_return_type() {
        let a = CandidateMember::method("push", ["String"], "String");
        let b = CandidateMember::method("push", ["java.lang.String"], "void");
        let c = CandidateMember::method("push", ["int"], "String");
        assert!(a.same_signature(&b));
        assert!(!a.same_signature(&c));
    }

    #[test]
    fn member_id_ordering_groups_kinds() {
        assert!(MemberId::constructor(5) < MemberId::method(0));
        assert_ne!(MemberId::method(1), MemberId::method(2));
    }

    #[test]
    fn display_signature() {
        let m = CandidateMember::method("add", ["int", "int"], "long");
        assert_eq!(m.display_signature(), "add(int,int) -> long");
    }
}
