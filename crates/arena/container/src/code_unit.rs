//! Capability boundary between the Arena and candidate code.
//!
//! A [`CodeUnit`] describes a candidate and knows how to load itself into a
//! container. Loading yields a [`LoadedUnit`], private to that container,
//! which in turn constructs [`Instance`]s.

use arena_types::{CandidateMember, Value};

use crate::context::InvocationContext;
use crate::environment::ContainerEnvironment;
use crate::error::{ContainerResult, Fault};

/// A candidate implementation as seen by the adaptation engine.
pub trait CodeUnit: Send + Sync {
    /// Human-readable name, usually the class name.
    fn name(&self) -> &str;

    fn constructors(&self) -> Vec<CandidateMember>;

    fn methods(&self) -> Vec<CandidateMember>;

    /// Load the unit into the container described by `env`. Each call must
    /// produce fresh class state.
    fn load(&self, env: &ContainerEnvironment) -> ContainerResult<Box<dyn LoadedUnit>>;
}

/// A code unit loaded into exactly one container.
pub trait LoadedUnit: Send + Sync {
    fn construct(
        &self,
        constructor: &CandidateMember,
        args: Vec<Value>,
        ctx: &InvocationContext,
    ) -> Result<Box<dyn Instance>, Fault>;
}

/// A live object of a loaded unit.
pub trait Instance: Send {
    fn call(
        &mut self,
        method: &CandidateMember,
        args: Vec<Value>,
        ctx: &InvocationContext,
    ) -> Result<Value, Fault>;
}
