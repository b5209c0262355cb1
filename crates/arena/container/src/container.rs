//! The container contract and its in-process implementation.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arena_types::{CandidateMember, ContainerId, InstanceId, ObjectRef, TypeName, Value};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::code_unit::{CodeUnit, Instance, LoadedUnit};
use crate::context::{CancellationToken, InvocationContext};
use crate::environment::ContainerEnvironment;
use crate::error::{ContainerError, ContainerResult, Fault};

/// Isolated namespace hosting one candidate.
///
/// Calls are synchronous; time bounds are the caller's concern. Containers
/// are exclusively owned by one adapted implementation and are not meant to
/// be invoked concurrently. A call that a supervisor abandons (its token
/// tripped) without the candidate honouring the cancellation leaves the
/// receiver poisoned: later calls on it fail fast with
/// [`Fault::Abandoned`].
pub trait Container: Send + Sync {
    fn id(&self) -> &ContainerId;

    fn environment(&self) -> &Arc<ContainerEnvironment>;

    /// Load a code unit. A container holds at most one unit.
    fn load(&self, unit: &dyn CodeUnit) -> ContainerResult<()>;

    fn instantiate(
        &self,
        constructor: &CandidateMember,
        args: Vec<Value>,
        cancel: &CancellationToken,
    ) -> Result<ObjectRef, Fault>;

    fn invoke(
        &self,
        receiver: &ObjectRef,
        method: &CandidateMember,
        args: Vec<Value>,
        cancel: &CancellationToken,
    ) -> Result<Value, Fault>;

    /// Release every instance, static and owned directory. Idempotent.
    fn dispose(&self);

    fn is_disposed(&self) -> bool;

    fn instance_count(&self) -> usize;
}

/// How often a call waiting on a busy instance rechecks its token.
const LOCK_POLL: Duration = Duration::from_millis(10);

/// How long a call waits for an abandoned call on the same instance to
/// honour its cancellation before the instance is given up on.
const ABANDON_GRACE: Duration = Duration::from_millis(50);

/// One live instance.
///
/// `in_flight` holds the token of the call currently running on the
/// instance. An instance is poisoned once a call outlives its supervisor
/// without honouring the cancellation: its state no longer follows the
/// recorded statements.
struct Slot {
    state: Mutex<Box<dyn Instance>>,
    in_flight: Mutex<Option<CancellationToken>>,
    poisoned: AtomicBool,
}

impl Slot {
    fn new(instance: Box<dyn Instance>) -> Self {
        Self {
            state: Mutex::new(instance),
            in_flight: Mutex::new(None),
            poisoned: AtomicBool::new(false),
        }
    }

    fn is_poisoned(&self) -> bool {
        self.poisoned.load(Ordering::SeqCst)
    }

    fn poison(&self) {
        self.poisoned.store(true, Ordering::SeqCst);
    }

    /// The running call, if any, has been given up on by its supervisor.
    fn running_call_abandoned(&self) -> bool {
        self.in_flight
            .lock()
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

type SharedInstance = Arc<Slot>;

struct Loaded {
    unit_name: String,
    unit: Arc<dyn LoadedUnit>,
}

/// Container running candidate code on the calling thread.
pub struct InProcessContainer {
    env: Arc<ContainerEnvironment>,
    loaded: RwLock<Option<Loaded>>,
    instances: Mutex<HashMap<InstanceId, SharedInstance>>,
    next_instance: AtomicU64,
    disposed: AtomicBool,
}

impl InProcessContainer {
    pub fn new(env: ContainerEnvironment) -> Self {
        Self {
            env: Arc::new(env),
            loaded: RwLock::new(None),
            instances: Mutex::new(HashMap::new()),
            next_instance: AtomicU64::new(1),
            disposed: AtomicBool::new(false),
        }
    }

    /// Name of the loaded unit, if any.
    pub fn unit_name(&self) -> Option<String> {
        self.loaded.read().as_ref().map(|l| l.unit_name.clone())
    }

    fn ensure_live(&self) -> Result<(), ContainerError> {
        if self.disposed.load(Ordering::SeqCst) {
            Err(ContainerError::Disposed(self.env.id.clone()))
        } else {
            Ok(())
        }
    }

    fn check_owned(&self, value: &Value) -> Result<(), ContainerError> {
        match value {
            Value::Object(obj) if obj.container != self.env.id => {
                Err(ContainerError::ForeignObject {
                    expected: self.env.id.clone(),
                    found: obj.container.clone(),
                })
            }
            Value::Array(items) => items.iter().try_for_each(|v| self.check_owned(v)),
            _ => Ok(()),
        }
    }

    fn context(&self, cancel: &CancellationToken) -> InvocationContext {
        InvocationContext::new(Arc::clone(&self.env), cancel.clone())
    }
}

impl Container for InProcessContainer {
    fn id(&self) -> &ContainerId {
        &self.env.id
    }

    fn environment(&self) -> &Arc<ContainerEnvironment> {
        &self.env
    }

    fn load(&self, unit: &dyn CodeUnit) -> ContainerResult<()> {
        self.ensure_live()?;
        let mut loaded = self.loaded.write();
        if let Some(existing) = loaded.as_ref() {
            return Err(ContainerError::AlreadyLoaded {
                container: self.env.id.clone(),
                unit: existing.unit_name.clone(),
            });
        }
        let unit_impl = unit.load(&self.env)?;
        debug!(container = %self.env.id, unit = unit.name(), "Loaded code unit");
        *loaded = Some(Loaded {
            unit_name: unit.name().to_string(),
            unit: Arc::from(unit_impl),
        });
        Ok(())
    }

    fn instantiate(
        &self,
        constructor: &CandidateMember,
        args: Vec<Value>,
        cancel: &CancellationToken,
    ) -> Result<ObjectRef, Fault> {
        self.ensure_live()?;
        args.iter().try_for_each(|a| self.check_owned(a))?;
        let unit = self
            .loaded
            .read()
            .as_ref()
            .map(|l| Arc::clone(&l.unit))
            .ok_or_else(|| ContainerError::NotLoaded(self.env.id.clone()))?;

        let ctx = self.context(cancel);
        let instance = guarded(|| unit.construct(constructor, args, &ctx))?;

        let id = InstanceId(self.next_instance.fetch_add(1, Ordering::SeqCst));
        self.instances
            .lock()
            .insert(id, Arc::new(Slot::new(instance)));
        Ok(ObjectRef {
            container: self.env.id.clone(),
            instance: id,
            type_name: TypeName::new(&constructor.name),
        })
    }

    fn invoke(
        &self,
        receiver: &ObjectRef,
        method: &CandidateMember,
        args: Vec<Value>,
        cancel: &CancellationToken,
    ) -> Result<Value, Fault> {
        self.ensure_live()?;
        self.check_owned(&Value::Object(receiver.clone()))?;
        args.iter().try_for_each(|a| self.check_owned(a))?;
        let instance = self
            .instances
            .lock()
            .get(&receiver.instance)
            .cloned()
            .ok_or_else(|| ContainerError::UnknownInstance {
                container: self.env.id.clone(),
                instance: receiver.instance,
            })?;

        let abandoned = || Fault::Abandoned {
            instance: receiver.instance,
        };
        let mut waited = Duration::ZERO;
        let mut guard = loop {
            if instance.is_poisoned() {
                return Err(abandoned());
            }
            if cancel.is_cancelled() {
                return Err(Fault::Cancelled);
            }
            if let Some(guard) = instance.state.try_lock_for(LOCK_POLL) {
                break guard;
            }
            if instance.running_call_abandoned() {
                waited += LOCK_POLL;
                if waited >= ABANDON_GRACE {
                    instance.poison();
                    warn!(
                        container = %self.env.id,
                        instance = %receiver.instance,
                        "Abandoned call still running; instance poisoned"
                    );
                    return Err(abandoned());
                }
            }
        };
        if instance.is_poisoned() {
            return Err(abandoned());
        }
        // the supervisor may have given up while this call waited
        if cancel.is_cancelled() {
            return Err(Fault::Cancelled);
        }

        *instance.in_flight.lock() = Some(cancel.clone());
        let ctx = self.context(cancel);
        let result = guarded(|| guard.call(method, args, &ctx));
        *instance.in_flight.lock() = None;
        if cancel.is_cancelled() && !matches!(result, Err(Fault::Cancelled)) {
            instance.poison();
            warn!(
                container = %self.env.id,
                instance = %receiver.instance,
                "Call finished after its deadline; instance poisoned"
            );
        }
        result
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let released = {
            let mut instances = self.instances.lock();
            let n = instances.len();
            instances.clear();
            n
        };
        self.loaded.write().take();
        self.env.statics.clear();
        if let Some(dir) = &self.env.owned_work_dir {
            if let Err(e) = std::fs::remove_dir_all(dir) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(container = %self.env.id, dir = %dir.display(), error = %e, "Failed to remove work dir");
                }
            }
        }
        debug!(container = %self.env.id, released, "Container disposed");
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn instance_count(&self) -> usize {
        self.instances.lock().len()
    }
}

impl Drop for InProcessContainer {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Run candidate code, turning panics into faults.
fn guarded<T>(f: impl FnOnce() -> Result<T, Fault>) -> Result<T, Fault> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(Fault::Panicked {
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
