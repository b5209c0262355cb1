//! Container lifecycle errors and per-call faults.

use arena_types::{ContainerId, InstanceId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors in the container lifecycle itself, as opposed to faults raised by
/// candidate code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    #[error("container {0} has been disposed")]
    Disposed(ContainerId),

    #[error("container {0} has no code unit loaded")]
    NotLoaded(ContainerId),

    #[error("container {container} already holds code unit '{unit}'")]
    AlreadyLoaded { container: ContainerId, unit: String },

    #[error("unknown instance #{instance} in container {container}")]
    UnknownInstance {
        container: ContainerId,
        instance: InstanceId,
    },

    #[error("object from container {found} passed into container {expected}")]
    ForeignObject {
        expected: ContainerId,
        found: ContainerId,
    },

    #[error("loading '{unit}' failed: {reason}")]
    Load { unit: String, reason: String },

    #[error("sandbox setup failed: {0}")]
    SandboxSetup(String),
}

/// Result alias for container lifecycle operations.
pub type ContainerResult<T> = Result<T, ContainerError>;

/// A failure observed while running one call into candidate code.
///
/// Faults are data: they are recorded in actuation sheets and never abort the
/// host.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "fault", rename_all = "snake_case")]
pub enum Fault {
    /// The candidate raised an error of its own.
    #[error("{kind}: {message}")]
    Thrown { kind: String, message: String },

    /// The candidate attempted an operation its sandbox forbids.
    #[error("sandbox violation: {message}")]
    SandboxViolation { message: String },

    /// The candidate panicked.
    #[error("candidate panicked: {message}")]
    Panicked { message: String },

    /// The call observed its cancellation token and gave up.
    #[error("call cancelled")]
    Cancelled,

    /// An earlier call on the receiver timed out and was abandoned, so the
    /// instance state is no longer trustworthy.
    #[error("instance #{instance} was abandoned by a timed-out call")]
    Abandoned { instance: InstanceId },

    /// An argument or result could not be converted between types.
    #[error("conversion failed: {message}")]
    Conversion { message: String },

    /// The statement could not be dispatched (bad receiver, missing binding,
    /// failed upstream input).
    #[error("dispatch failed: {message}")]
    Dispatch { message: String },

    /// The container refused the call.
    #[error("container error: {message}")]
    Container { message: String },
}

impl Fault {
    pub fn thrown(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Fault::Thrown {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn sandbox(message: impl Into<String>) -> Self {
        Fault::SandboxViolation {
            message: message.into(),
        }
    }

    pub fn conversion(message: impl Into<String>) -> Self {
        Fault::Conversion {
            message: message.into(),
        }
    }

    pub fn dispatch(message: impl Into<String>) -> Self {
        Fault::Dispatch {
            message: message.into(),
        }
    }

    pub fn is_sandbox_violation(&self) -> bool {
        matches!(self, Fault::SandboxViolation { .. })
    }
}

impl From<ContainerError> for Fault {
    fn from(err: ContainerError) -> Self {
        Fault::Container {
            message: err.to_string(),
        }
    }
}
