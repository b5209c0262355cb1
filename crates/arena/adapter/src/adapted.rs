//! Adapted implementations: a code unit, one validated permutation, and the
//! container it was loaded into.

use std::sync::Arc;

use arena_container::{CodeUnit, Container};
use arena_types::{ContainerId, InterfaceSpecification, MemberId};

use crate::candidate::MemberBinding;
use crate::permutation::Permutation;

/// A candidate adapted to a specification and ready to run.
///
/// Owns its container exclusively; dropping the adapted implementation
/// disposes the container.
pub struct AdaptedImplementation {
    unit: Arc<dyn CodeUnit>,
    spec: Arc<InterfaceSpecification>,
    permutation: Permutation,
    rank: usize,
    container: Arc<dyn Container>,
}

impl AdaptedImplementation {
    pub fn new(
        unit: Arc<dyn CodeUnit>,
        spec: Arc<InterfaceSpecification>,
        permutation: Permutation,
        rank: usize,
        container: Arc<dyn Container>,
    ) -> Self {
        Self {
            unit,
            spec,
            permutation,
            rank,
            container,
        }
    }

    pub fn unit(&self) -> &Arc<dyn CodeUnit> {
        &self.unit
    }

    pub fn unit_name(&self) -> &str {
        self.unit.name()
    }

    pub fn spec(&self) -> &Arc<InterfaceSpecification> {
        &self.spec
    }

    pub fn permutation(&self) -> &Permutation {
        &self.permutation
    }

    /// Zero-based position in the ranking, 0 being the best.
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn container(&self) -> &Arc<dyn Container> {
        &self.container
    }

    pub fn container_id(&self) -> &ContainerId {
        self.container.id()
    }

    /// `Unit#rank`, used in logs and reports.
    pub fn label(&self) -> String {
        format!("{}#{}", self.unit.name(), self.rank)
    }

    /// The member bound to specification method `method_index`.
    pub fn method_binding(&self, method_index: usize) -> Option<&MemberBinding> {
        self.permutation
            .candidate_for(method_index)
            .map(|c| &c.binding)
    }

    /// Constructor to use when a sheet creates the abstraction with `arity`
    /// arguments: the permutation's binding when the specification declares
    /// such a constructor, otherwise the unit's first constructor of that
    /// arity.
    pub fn constructor_for(&self, arity: usize) -> Option<MemberBinding> {
        if let Some((index, _)) = self.spec.find_constructor(arity) {
            return self.method_binding(index).cloned();
        }
        self.unit
            .constructors()
            .into_iter()
            .enumerate()
            .find(|(_, m)| m.arity() == arity)
            .map(|(i, m)| MemberBinding::exact(MemberId::constructor(i), m))
    }

    /// Dispose the container now rather than on drop.
    pub fn dispose(&self) {
        self.container.dispose();
    }
}

impl Drop for AdaptedImplementation {
    fn drop(&mut self) {
        self.container.dispose();
    }
}

impl std::fmt::Debug for AdaptedImplementation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaptedImplementation")
            .field("unit", &self.unit.name())
            .field("spec", &self.spec.name())
            .field("rank", &self.rank)
            .field("container", self.container.id())
            .field("permutation", &self.permutation)
            .finish()
    }
}
