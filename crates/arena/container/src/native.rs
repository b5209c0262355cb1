//! Code units backed by host Rust closures.
//!
//! Useful for reference implementations, fixtures and candidates that were
//! compiled into the host. The per-instance state type `S` is built by a
//! constructor closure and threaded through every method closure.

use std::sync::Arc;

use arena_types::{CandidateMember, TypeName, Value};

use crate::code_unit::{CodeUnit, Instance, LoadedUnit};
use crate::context::InvocationContext;
use crate::environment::ContainerEnvironment;
use crate::error::{ContainerResult, Fault};

type CtorFn<S> = Arc<dyn Fn(&[Value], &InvocationContext) -> Result<S, Fault> + Send + Sync>;
type MethodFn<S> =
    Arc<dyn Fn(&mut S, &[Value], &InvocationContext) -> Result<Value, Fault> + Send + Sync>;
type LoadHook = Arc<dyn Fn(&ContainerEnvironment) -> ContainerResult<()> + Send + Sync>;

/// Builder-style native candidate.
pub struct NativeCodeUnit<S> {
    name: String,
    constructors: Vec<(CandidateMember, CtorFn<S>)>,
    methods: Arc<Vec<(CandidateMember, MethodFn<S>)>>,
    on_load: Option<LoadHook>,
}

impl<S: Send + 'static> NativeCodeUnit<S> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constructors: Vec::new(),
            methods: Arc::new(Vec::new()),
            on_load: None,
        }
    }

    pub fn constructor<I, F>(mut self, params: I, f: F) -> Self
    where
        I: IntoIterator,
        I::Item: Into<TypeName>,
        F: Fn(&[Value], &InvocationContext) -> Result<S, Fault> + Send + Sync + 'static,
    {
        let member = CandidateMember::constructor(self.name.clone(), params);
        self.constructors.push((member, Arc::new(f)));
        self
    }

    pub fn method<I, F>(
        mut self,
        name: impl Into<String>,
        params: I,
        return_type: impl Into<TypeName>,
        f: F,
    ) -> Self
    where
        I: IntoIterator,
        I::Item: Into<TypeName>,
        F: Fn(&mut S, &[Value], &InvocationContext) -> Result<Value, Fault>
            + Send
            + Sync
            + 'static,
    {
        let member = CandidateMember::method(name, params, return_type);
        Arc::make_mut(&mut self.methods).push((member, Arc::new(f)));
        self
    }

    /// Hook run every time the unit is loaded into a container, typically to
    /// initialise statics.
    pub fn on_load<F>(mut self, f: F) -> Self
    where
        F: Fn(&ContainerEnvironment) -> ContainerResult<()> + Send + Sync + 'static,
    {
        self.on_load = Some(Arc::new(f));
        self
    }
}

impl<S: Send + 'static> CodeUnit for NativeCodeUnit<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn constructors(&self) -> Vec<CandidateMember> {
        self.constructors.iter().map(|(m, _)| m.clone()).collect()
    }

    fn methods(&self) -> Vec<CandidateMember> {
        self.methods.iter().map(|(m, _)| m.clone()).collect()
    }

    fn load(&self, env: &ContainerEnvironment) -> ContainerResult<Box<dyn LoadedUnit>> {
        if let Some(hook) = &self.on_load {
            hook(env)?;
        }
        Ok(Box::new(NativeLoaded {
            constructors: self.constructors.clone(),
            methods: Arc::clone(&self.methods),
        }))
    }
}

struct NativeLoaded<S> {
    constructors: Vec<(CandidateMember, CtorFn<S>)>,
    methods: Arc<Vec<(CandidateMember, MethodFn<S>)>>,
}

impl<S: Send + 'static> LoadedUnit for NativeLoaded<S> {
    fn construct(
        &self,
        constructor: &CandidateMember,
        args: Vec<Value>,
        ctx: &InvocationContext,
    ) -> Result<Box<dyn Instance>, Fault> {
        let (member, f) = self
            .constructors
            .iter()
            .find(|(m, _)| m.same_signature(constructor))
            .ok_or_else(|| {
                Fault::thrown("NoSuchMethodError", constructor.display_signature())
            })?;
        check_arity(member, &args)?;
        let state = f(&args, ctx)?;
        Ok(Box::new(NativeInstance {
            state,
            methods: Arc::clone(&self.methods),
        }))
    }
}

struct NativeInstance<S> {
    state: S,
    methods: Arc<Vec<(CandidateMember, MethodFn<S>)>>,
}

impl<S: Send + 'static> Instance for NativeInstance<S> {
    fn call(
        &mut self,
        method: &CandidateMember,
        args: Vec<Value>,
        ctx: &InvocationContext,
    ) -> Result<Value, Fault> {
        let (member, f) = self
            .methods
            .iter()
            .find(|(m, _)| m.same_signature(method))
            .ok_or_else(|| Fault::thrown("NoSuchMethodError", method.display_signature()))?;
        check_arity(member, &args)?;
        f(&mut self.state, &args, ctx)
    }
}

fn check_arity(member: &CandidateMember, args: &[Value]) -> Result<(), Fault> {
    if member.arity() == args.len() {
        Ok(())
    } else {
        Err(Fault::thrown(
            "IllegalArgumentException",
            format!(
                "{} expects {} argument(s), got {}",
                member.name,
                member.arity(),
                args.len()
            ),
        ))
    }
}
