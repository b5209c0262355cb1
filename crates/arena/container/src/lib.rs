//! # arena-container
//!
//! Execution containers for Arena candidates.
//!
//! A container is an isolated namespace that owns the loaded state of exactly
//! one candidate code unit: its per-class statics, its live instances and its
//! sandbox policy. The adaptation engine and the SSN runner only ever talk to
//! the [`Container`] contract; how a unit is actually loaded is the business
//! of the [`CodeUnit`] capability.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────┐   create(id, host)   ┌───────────────────────┐
//!   │ ContainerFactory │ ───────────────────▶ │ InProcessContainer    │
//!   │ default/sandbox/ │                      │  ├─ ContainerEnvironment
//!   │ instrumented     │                      │  │   ├─ SandboxPolicy │
//!   └──────────────────┘                      │  │   └─ StaticStore   │
//!                                             │  ├─ LoadedUnit        │
//!   ┌──────────────────┐   load(env)          │  └─ instances         │
//!   │ CodeUnit         │ ◀─────────────────── │                       │
//!   └──────────────────┘                      └───────────────────────┘
//! ```
//!
//! ## Isolation
//!
//! - Each container loads its own copy of the unit; statics never leak
//!   between containers.
//! - Object references carry their container id and are rejected elsewhere.
//! - Candidate code reaches the filesystem and process control only through
//!   [`InvocationContext`], which enforces the container's [`SandboxPolicy`].
//! - Panics in candidate code are caught and reported as [`Fault`]s.
//! - Disposal releases every instance and static.

#![deny(unsafe_code)]

pub mod code_unit;
pub mod container;
pub mod context;
pub mod environment;
pub mod error;
pub mod factory;
pub mod native;
pub mod sandbox;

pub use code_unit::{CodeUnit, Instance, LoadedUnit};
pub use container::{Container, InProcessContainer};
pub use context::{CancellationToken, InvocationContext};
pub use environment::{ContainerEnvironment, HostEnvironment, StaticStore};
pub use error::{ContainerError, ContainerResult, Fault};
pub use factory::{
    CallKind, CallRecord, CallRecorder, ContainerFactory, DefaultContainerFactory,
    InstrumentedContainer, InstrumentedContainerFactory, InvocationObserver,
    SandboxedContainerFactory,
};
pub use native::NativeCodeUnit;
pub use sandbox::SandboxPolicy;
