//! Per-call context handed to candidate code.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arena_types::ContainerId;
use tracing::warn;

use crate::environment::{ContainerEnvironment, StaticStore};
use crate::error::Fault;

/// Cooperative cancellation flag shared between a call and its supervisor.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// The only channel through which candidate code reaches the host.
///
/// Long-running candidate code is expected to call [`checkpoint`](Self::checkpoint)
/// so that a timed-out call actually stops.
#[derive(Clone, Debug)]
pub struct InvocationContext {
    env: Arc<ContainerEnvironment>,
    cancel: CancellationToken,
}

impl InvocationContext {
    pub fn new(env: Arc<ContainerEnvironment>, cancel: CancellationToken) -> Self {
        Self { env, cancel }
    }

    pub fn container_id(&self) -> &ContainerId {
        &self.env.id
    }

    pub fn statics(&self) -> &StaticStore {
        &self.env.statics
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.env.properties.get(key).map(String::as_str)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// `Err(Fault::Cancelled)` once the supervising runner gave up on the call.
    pub fn checkpoint(&self) -> Result<(), Fault> {
        if self.cancel.is_cancelled() {
            Err(Fault::Cancelled)
        } else {
            Ok(())
        }
    }

    pub fn read_to_string(&self, path: impl AsRef<Path>) -> Result<String, Fault> {
        let resolved = self.env.policy.check_read(path.as_ref())?;
        std::fs::read_to_string(&resolved).map_err(|e| io_fault(&resolved, e))
    }

    pub fn write(&self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<(), Fault> {
        let resolved = self.env.policy.check_write(path.as_ref())?;
        if let Some(parent) = resolved.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_fault(parent, e))?;
        }
        std::fs::write(&resolved, contents).map_err(|e| io_fault(&resolved, e))
    }

    pub fn remove_file(&self, path: impl AsRef<Path>) -> Result<(), Fault> {
        let resolved = self.env.policy.check_write(path.as_ref())?;
        std::fs::remove_file(&resolved).map_err(|e| io_fault(&resolved, e))
    }

    /// Candidate code asking to terminate the process. Always refused; the
    /// returned fault should be propagated by the caller.
    pub fn exit(&self, code: i32) -> Fault {
        warn!(container = %self.env.id, code, "Candidate attempted process exit");
        self.env.policy.check_exit(code)
    }
}

fn io_fault(path: &Path, err: std::io::Error) -> Fault {
    Fault::thrown("IOException", format!("{}: {}", path.display(), err))
}
