//! Sandbox policy enforced at the container boundary.
//!
//! Candidate code has no direct handle on the host: filesystem access and
//! process control go through [`InvocationContext`](crate::InvocationContext),
//! which consults the policy below. Paths are normalised lexically before
//! checks, so `work/../../etc` cannot escape the working directory.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::error::Fault;

/// Filesystem and process rules for one container.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxPolicy {
    /// Container-scoped working directory. Writes are only allowed inside it;
    /// `None` denies every write.
    pub work_dir: Option<PathBuf>,
    /// Additional directories candidate code may read from.
    pub read_only_roots: Vec<PathBuf>,
}

impl SandboxPolicy {
    /// No filesystem access at all.
    pub fn deny_all() -> Self {
        Self::default()
    }

    /// Read/write access confined to `work_dir`.
    pub fn scoped(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: Some(work_dir.into()),
            read_only_roots: Vec::new(),
        }
    }

    pub fn with_read_only_roots(mut self, roots: impl IntoIterator<Item = PathBuf>) -> Self {
        self.read_only_roots.extend(roots);
        self
    }

    /// Resolve `path` for reading, or explain why it is denied.
    pub fn check_read(&self, path: &Path) -> Result<PathBuf, Fault> {
        let resolved = self.resolve(path)?;
        let in_work_dir = self
            .work_dir
            .as_ref()
            .map(|dir| resolved.starts_with(normalize(dir)))
            .unwrap_or(false);
        let in_read_only = self
            .read_only_roots
            .iter()
            .any(|root| resolved.starts_with(normalize(root)));
        if in_work_dir || in_read_only {
            Ok(resolved)
        } else {
            Err(Fault::sandbox(format!(
                "read access to {} denied",
                resolved.display()
            )))
        }
    }

    /// Resolve `path` for writing, or explain why it is denied.
    pub fn check_write(&self, path: &Path) -> Result<PathBuf, Fault> {
        let resolved = self.resolve(path)?;
        match &self.work_dir {
            Some(dir) if resolved.starts_with(normalize(dir)) => Ok(resolved),
            _ => Err(Fault::sandbox(format!(
                "write access to {} denied",
                resolved.display()
            ))),
        }
    }

    /// Process termination is never permitted from candidate code.
    pub fn check_exit(&self, code: i32) -> Fault {
        Fault::sandbox(format!("process exit({}) is not permitted", code))
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf, Fault> {
        if path.is_absolute() {
            return Ok(normalize(path));
        }
        match &self.work_dir {
            Some(dir) => Ok(normalize(&dir.join(path))),
            None => Err(Fault::sandbox(format!(
                "relative path {} without a working directory",
                path.display()
            ))),
        }
    }
}

/// Lexical normalisation: drops `.` and folds `..` without touching the
/// filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
