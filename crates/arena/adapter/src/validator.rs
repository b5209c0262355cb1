//! Permutation validators.

use std::sync::Arc;

use arena_types::InterfaceSpecification;

use crate::permutation::Permutation;

/// Accepts or rejects a complete permutation.
pub trait PermutationValidator: Send + Sync {
    fn validate(&self, spec: &InterfaceSpecification, permutation: &Permutation) -> bool;

    fn name(&self) -> &'static str;
}

/// Bound members must be pairwise distinct, unless the specification has
/// exactly one method. Also rejects permutations whose length differs from
/// the specification's method count.
#[derive(Debug, Default, Clone, Copy)]
pub struct DistinctMemberValidator;

impl PermutationValidator for DistinctMemberValidator {
    fn validate(&self, spec: &InterfaceSpecification, permutation: &Permutation) -> bool {
        if permutation.len() != spec.len() {
            return false;
        }
        spec.len() == 1 || permutation.members_distinct()
    }

    fn name(&self) -> &'static str {
        "distinct-members"
    }
}

/// AND of every contained validator. An empty composite accepts everything.
#[derive(Clone, Default)]
pub struct CompositeValidator {
    validators: Vec<Arc<dyn PermutationValidator>>,
}

impl CompositeValidator {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Just the [`DistinctMemberValidator`].
    pub fn standard() -> Self {
        Self::empty().with(Arc::new(DistinctMemberValidator))
    }

    pub fn with(mut self, validator: Arc<dyn PermutationValidator>) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Name of the first validator that rejects, if any.
    pub fn first_rejection(
        &self,
        spec: &InterfaceSpecification,
        permutation: &Permutation,
    ) -> Option<&'static str> {
        self.validators
            .iter()
            .find(|v| !v.validate(spec, permutation))
            .map(|v| v.name())
    }
}

impl PermutationValidator for CompositeValidator {
    fn validate(&self, spec: &InterfaceSpecification, permutation: &Permutation) -> bool {
        self.first_rejection(spec, permutation).is_none()
    }

    fn name(&self) -> &'static str {
        "composite"
    }
}

impl std::fmt::Debug for CompositeValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.validators.iter().map(|v| v.name()).collect();
        f.debug_struct("CompositeValidator")
            .field("validators", &names)
            .finish()
    }
}
