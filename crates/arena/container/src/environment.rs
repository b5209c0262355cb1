//! Host and per-container environments.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use arena_types::{ContainerId, Value};
use parking_lot::Mutex;

use crate::sandbox::SandboxPolicy;

/// What the host exposes to every container it creates.
#[derive(Clone, Debug, Default)]
pub struct HostEnvironment {
    /// Read-only properties visible to candidate code.
    pub properties: BTreeMap<String, String>,
    /// Directories candidate code may read in any container.
    pub read_only_roots: Vec<PathBuf>,
}

impl HostEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_read_only_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.read_only_roots.push(root.into());
        self
    }
}

/// Class-level mutable state of the units loaded into one container.
///
/// Keys are free-form (`"Counter.instances"`); the store is cleared when the
/// container is disposed.
#[derive(Clone, Debug, Default)]
pub struct StaticStore {
    slots: Arc<Mutex<HashMap<String, Value>>>,
}

impl StaticStore {
    pub fn get(&self, key: &str) -> Option<Value> {
        self.slots.lock().get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.slots.lock().insert(key.into(), value);
    }

    /// Atomically update a slot, starting from `Value::Null` when absent.
    pub fn update<F>(&self, key: &str, f: F) -> Value
    where
        F: FnOnce(&Value) -> Value,
    {
        let mut slots = self.slots.lock();
        let current = slots.get(key).cloned().unwrap_or(Value::Null);
        let next = f(&current);
        slots.insert(key.to_string(), next.clone());
        next
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    pub fn clear(&self) {
        self.slots.lock().clear();
    }
}

/// Everything a container owns apart from its instances.
#[derive(Clone, Debug)]
pub struct ContainerEnvironment {
    pub id: ContainerId,
    pub policy: SandboxPolicy,
    pub statics: StaticStore,
    pub properties: BTreeMap<String, String>,
    /// Work directory created for this container and removed on disposal.
    pub owned_work_dir: Option<PathBuf>,
}

impl ContainerEnvironment {
    pub fn new(id: ContainerId, policy: SandboxPolicy, host: &HostEnvironment) -> Self {
        let policy = policy.with_read_only_roots(host.read_only_roots.iter().cloned());
        Self {
            id,
            policy,
            statics: StaticStore::default(),
            properties: host.properties.clone(),
            owned_work_dir: None,
        }
    }
}
