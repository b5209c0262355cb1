//! Container factories.
//!
//! The adaptation engine asks a factory for a fresh container per adapted
//! implementation. Swapping the factory changes isolation or adds
//! instrumentation without touching adaptation or interpretation logic.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use arena_types::{CandidateMember, ContainerId, ObjectRef, Value};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::code_unit::CodeUnit;
use crate::container::{Container, InProcessContainer};
use crate::context::CancellationToken;
use crate::environment::{ContainerEnvironment, HostEnvironment};
use crate::error::{ContainerError, ContainerResult, Fault};
use crate::sandbox::SandboxPolicy;

/// Creates containers.
pub trait ContainerFactory: Send + Sync {
    fn create(&self, id: ContainerId, host: &HostEnvironment)
        -> ContainerResult<Arc<dyn Container>>;

    /// Short label used in logs.
    fn kind(&self) -> &'static str;
}

/// In-process containers with no filesystem access.
#[derive(Debug, Default, Clone)]
pub struct DefaultContainerFactory;

impl ContainerFactory for DefaultContainerFactory {
    fn create(
        &self,
        id: ContainerId,
        host: &HostEnvironment,
    ) -> ContainerResult<Arc<dyn Container>> {
        let env = ContainerEnvironment::new(id, SandboxPolicy::deny_all(), host);
        Ok(Arc::new(InProcessContainer::new(env)))
    }

    fn kind(&self) -> &'static str {
        "default"
    }
}

/// In-process containers, each with its own working directory under `root`.
/// The directory is removed when the container is disposed.
#[derive(Debug, Clone)]
pub struct SandboxedContainerFactory {
    root: PathBuf,
}

impl SandboxedContainerFactory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

impl ContainerFactory for SandboxedContainerFactory {
    fn create(
        &self,
        id: ContainerId,
        host: &HostEnvironment,
    ) -> ContainerResult<Arc<dyn Container>> {
        let work_dir = self.root.join(id.as_str());
        std::fs::create_dir_all(&work_dir).map_err(|e| {
            ContainerError::SandboxSetup(format!("{}: {}", work_dir.display(), e))
        })?;
        debug!(container = %id, work_dir = %work_dir.display(), "Created sandbox work dir");
        let mut env = ContainerEnvironment::new(id, SandboxPolicy::scoped(&work_dir), host);
        env.owned_work_dir = Some(work_dir);
        Ok(Arc::new(InProcessContainer::new(env)))
    }

    fn kind(&self) -> &'static str {
        "sandboxed"
    }
}

// ── Instrumentation ─────────────────────────────────────────────────────

/// What kind of container call was observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallKind {
    Instantiate,
    Invoke,
}

/// One observed call into candidate code.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub container: ContainerId,
    pub kind: CallKind,
    pub member: String,
    pub fault: Option<String>,
    pub duration_nanos: u64,
}

impl CallRecord {
    pub fn succeeded(&self) -> bool {
        self.fault.is_none()
    }
}

/// Hook notified after every instantiate/invoke.
pub trait InvocationObserver: Send + Sync {
    fn on_call(&self, record: &CallRecord);
}

/// Observer that keeps every record in memory.
#[derive(Debug, Default)]
pub struct CallRecorder {
    records: Mutex<Vec<CallRecord>>,
}

impl CallRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<CallRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Number of calls whose member signature starts with `name(`.
    pub fn calls_to(&self, name: &str) -> usize {
        let prefix = format!("{}(", name);
        self.records
            .lock()
            .iter()
            .filter(|r| r.member.starts_with(&prefix))
            .count()
    }
}

impl InvocationObserver for CallRecorder {
    fn on_call(&self, record: &CallRecord) {
        self.records.lock().push(record.clone());
    }
}

/// Factory decorator attaching observers to every container it creates.
pub struct InstrumentedContainerFactory {
    inner: Arc<dyn ContainerFactory>,
    observers: Vec<Arc<dyn InvocationObserver>>,
}

impl InstrumentedContainerFactory {
    pub fn new(inner: Arc<dyn ContainerFactory>) -> Self {
        Self {
            inner,
            observers: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn InvocationObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

impl ContainerFactory for InstrumentedContainerFactory {
    fn create(
        &self,
        id: ContainerId,
        host: &HostEnvironment,
    ) -> ContainerResult<Arc<dyn Container>> {
        let inner = self.inner.create(id, host)?;
        Ok(Arc::new(InstrumentedContainer {
            inner,
            observers: self.observers.clone(),
        }))
    }

    fn kind(&self) -> &'static str {
        "instrumented"
    }
}

/// Container decorator reporting calls to observers.
pub struct InstrumentedContainer {
    inner: Arc<dyn Container>,
    observers: Vec<Arc<dyn InvocationObserver>>,
}

impl InstrumentedContainer {
    fn notify<T>(
        &self,
        kind: CallKind,
        member: &CandidateMember,
        started: Instant,
        result: &Result<T, Fault>,
    ) {
        let record = CallRecord {
            container: self.inner.id().clone(),
            kind,
            member: member.display_signature(),
            fault: result.as_ref().err().map(ToString::to_string),
            duration_nanos: started.elapsed().as_nanos() as u64,
        };
        for observer in &self.observers {
            observer.on_call(&record);
        }
    }
}

impl Container for InstrumentedContainer {
    fn id(&self) -> &ContainerId {
        self.inner.id()
    }

    fn environment(&self) -> &Arc<ContainerEnvironment> {
        self.inner.environment()
    }

    fn load(&self, unit: &dyn CodeUnit) -> ContainerResult<()> {
        self.inner.load(unit)
    }

    fn instantiate(
        &self,
        constructor: &CandidateMember,
        args: Vec<Value>,
        cancel: &CancellationToken,
    ) -> Result<ObjectRef, Fault> {
        let started = Instant::now();
        let result = self.inner.instantiate(constructor, args, cancel);
        self.notify(CallKind::Instantiate, constructor, started, &result);
        result
    }

    fn invoke(
        &self,
        receiver: &ObjectRef,
        method: &CandidateMember,
        args: Vec<Value>,
        cancel: &CancellationToken,
    ) -> Result<Value, Fault> {
        let started = Instant::now();
        let result = self.inner.invoke(receiver, method, args, cancel);
        self.notify(CallKind::Invoke, method, started, &result);
        result
    }

    fn dispose(&self) {
        self.inner.dispose()
    }

    fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }

    fn instance_count(&self) -> usize {
        self.inner.instance_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::NativeCodeUnit;

    fn echo_unit() -> NativeCodeUnit<()> {
        NativeCodeUnit::new("Echo")
            .constructor(Vec::<&str>::new(), |_, _| Ok(()))
            .method("echo", ["String"], "String", |_, args, _| Ok(args[0].clone()))
            .method("save", ["String"], "void", |_, args, ctx| {
                ctx.write("saved.txt", args[0].as_str().unwrap_or_default())?;
                Ok(Value::Null)
            })
    }

    #[test]
    fn default_factory_denies_fs() {
        let unit = echo_unit();
        let c = DefaultContainerFactory
            .create(ContainerId::from("d1"), &HostEnvironment::new())
            .unwrap();
        c.load(&unit).unwrap();
        let token = CancellationToken::new();
        let obj = c
            .instantiate(&unit.constructors()[0], vec![], &token)
            .unwrap();
        let fault = c
            .invoke(&obj, &unit.methods()[1], vec![Value::from("x")], &token)
            .unwrap_err();
        assert!(fault.is_sandbox_violation());
    }

    #[test]
    fn sandboxed_factory_scopes_and_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let factory = SandboxedContainerFactory::new(root.path());
        let unit = echo_unit();
        let c = factory
            .create(ContainerId::from("s1"), &HostEnvironment::new())
            .unwrap();
        c.load(&unit).unwrap();
        let token = CancellationToken::new();
        let obj = c
            .instantiate(&unit.constructors()[0], vec![], &token)
            .unwrap();
        c.invoke(&obj, &unit.methods()[1], vec![Value::from("data")], &token)
            .unwrap();
        let saved = root.path().join("s1").join("saved.txt");
        assert_eq!(std::fs::read_to_string(&saved).unwrap(), "data");

        c.dispose();
        assert!(!root.path().join("s1").exists());
    }

    #[test]
    fn instrumented_factory_records_calls() {
        let recorder = Arc::new(CallRecorder::new());
        let factory = InstrumentedContainerFactory::new(Arc::new(DefaultContainerFactory))
            .with_observer(recorder.clone());
        assert_eq!(factory.kind(), "instrumented");

        let unit = echo_unit();
        let c = factory
            .create(ContainerId::from("i1"), &HostEnvironment::new())
            .unwrap();
        c.load(&unit).unwrap();
        let token = CancellationToken::new();
        let obj = c
            .instantiate(&unit.constructors()[0], vec![], &token)
            .unwrap();
        c.invoke(&obj, &unit.methods()[0], vec![Value::from("hi")], &token)
            .unwrap();
        c.invoke(&obj, &unit.methods()[1], vec![Value::from("hi")], &token)
            .unwrap_err();

        let records = recorder.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].kind, CallKind::Instantiate);
        assert!(records[1].succeeded());
        assert!(!records[2].succeeded());
        assert_eq!(recorder.calls_to("echo"), 1);
        assert_eq!(recorder.calls_to("save"), 1);
    }
}
