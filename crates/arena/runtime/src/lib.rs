//! # arena-runtime
//!
//! Orchestration for the Arena: evaluates one stimulus sheet against a pool
//! of candidate code units and reports how each fared.
//!
//! ```text
//! StimulusSheet ─▶ interpret ─┐
//!                             ├─▶ per candidate (tokio task, bounded):
//! pool of CodeUnits ──────────┘     adapt ─▶ bind ─▶ run ─▶ oracle
//!                                                     │
//!                                                     ▼
//!                                               ArenaReport
//! ```
//!
//! Configuration is layered (defaults, file, `ARENA_` environment) through
//! [`ArenaConfig::load`]; [`init_tracing`] installs the subscriber.

#![deny(unsafe_code)]

pub mod arena;
pub mod config;
pub mod error;
pub mod executor;
pub mod report;
pub mod telemetry;

pub use arena::Arena;
pub use config::{ArenaConfig, ExecutionConfig, LoggingConfig, SandboxConfig, SandboxKind};
pub use error::{ArenaError, ArenaResult};
pub use executor::SheetExecutor;
pub use report::{AdapterRun, ArenaReport, CandidateReport, CandidateStatus};
pub use telemetry::init_tracing;
