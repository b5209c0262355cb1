//! Member filters applied before candidate binding.
//!
//! Filters compose with AND semantics: a member survives only if every filter
//! in the [`FilterChain`] accepts it.

use std::sync::Arc;

use arena_types::{CandidateMember, InterfaceSpecification};

/// Object-identity members inherited by every class.
const OBJECT_MEMBERS: &[&str] = &["equals", "hashCode", "toString", "clone", "finalize"];

/// Decides whether a candidate member takes part in adaptation.
pub trait MemberFilter: Send + Sync {
    fn accept(&self, spec: &InterfaceSpecification, member: &CandidateMember) -> bool;

    fn name(&self) -> &'static str;
}

/// Rejects the inherited object-identity members unless the specification asks
/// for a same-named member with arguments.
///
/// Arity-0 identity members are always rejected. `equals` taking anything
/// other than `Object` is a custom equality and passes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjectMethodFilter;

impl MemberFilter for ObjectMethodFilter {
    fn accept(&self, spec: &InterfaceSpecification, member: &CandidateMember) -> bool {
        if member.is_constructor || !OBJECT_MEMBERS.contains(&member.name.as_str()) {
            return true;
        }
        if member.arity() == 0 {
            return false;
        }
        if member.name == "equals" && !member.param_types.iter().all(|t| t.is_object()) {
            return true;
        }
        spec.declares_with_arguments(&member.name)
    }

    fn name(&self) -> &'static str {
        "object-methods"
    }
}

/// Rejects members whose name is blank.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlankNameFilter;

impl MemberFilter for BlankNameFilter {
    fn accept(&self, _spec: &InterfaceSpecification, member: &CandidateMember) -> bool {
        !member.name.trim().is_empty()
    }

    fn name(&self) -> &'static str {
        "blank-names"
    }
}

/// Ordered set of filters with AND semantics.
#[derive(Clone, Default)]
pub struct FilterChain {
    filters: Vec<Arc<dyn MemberFilter>>,
}

impl FilterChain {
    /// A chain that accepts everything.
    pub fn empty() -> Self {
        Self::default()
    }

    /// [`BlankNameFilter`] followed by [`ObjectMethodFilter`].
    pub fn standard() -> Self {
        Self::empty()
            .with(Arc::new(BlankNameFilter))
            .with(Arc::new(ObjectMethodFilter))
    }

    pub fn with(mut self, filter: Arc<dyn MemberFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn accept(&self, spec: &InterfaceSpecification, member: &CandidateMember) -> bool {
        self.filters.iter().all(|f| f.accept(spec, member))
    }
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.filters.iter().map(|f| f.name()).collect();
        f.debug_struct("FilterChain").field("filters", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_types::{MethodSignature, TypeName};

    fn none() -> Vec<TypeName> {
        Vec::new()
    }

    fn spec(methods: Vec<MethodSignature>) -> InterfaceSpecification {
        InterfaceSpecification::new("Stack", methods).unwrap()
    }

    #[test]
    fn identity_members_rejected_by_default() {
        let spec = spec(vec![MethodSignature::new("push", ["String"], ["String"])]);
        let f = ObjectMethodFilter;
        assert!(!f.accept(&spec, &CandidateMember::method("hashCode", none(), "int")));
        assert!(!f.accept(&spec, &CandidateMember::method("toString", none(), "String")));
        assert!(!f.accept(&spec, &CandidateMember::method("clone", none(), "Object")));
        assert!(!f.accept(&spec, &CandidateMember::method("finalize", none(), "void")));
        assert!(!f.accept(&spec, &CandidateMember::method("equals", ["Object"], "boolean")));
        assert!(f.accept(&spec, &CandidateMember::method("push", ["String"], "String")));
    }

    #[test]
    fn declared_equals_passes() {
        let spec = spec(vec![MethodSignature::new("equals", ["Object"], ["boolean"])]);
        let f = ObjectMethodFilter;
        assert!(f.accept(&spec, &CandidateMember::method("equals", ["Object"], "boolean")));
        // arity zero never passes, declared or not
        assert!(!f.accept(&spec, &CandidateMember::method("hashCode", none(), "int")));
    }

    #[test]
    fn typed_equals_passes() {
        let spec = spec(vec![MethodSignature::new("push", ["String"], ["String"])]);
        assert!(ObjectMethodFilter.accept(
            &spec,
            &CandidateMember::method("equals", ["Stack"], "boolean")
        ));
    }

    #[test]
    fn constructors_always_pass() {
        let spec = spec(vec![]);
        assert!(ObjectMethodFilter.accept(&spec, &CandidateMember::constructor("clone", none())));
    }

    #[test]
    fn chain_is_conjunctive() {
        let spec = spec(vec![]);
        let chain = FilterChain::standard();
        assert_eq!(chain.len(), 2);
        assert!(!chain.accept(&spec, &CandidateMember::method("  ", none(), "void")));
        assert!(!chain.accept(&spec, &CandidateMember::method("toString", none(), "String")));
        assert!(chain.accept(&spec, &CandidateMember::method("peek", none(), "String")));
        assert!(FilterChain::empty().accept(&spec, &CandidateMember::method("  ", none(), "void")));
    }
}
