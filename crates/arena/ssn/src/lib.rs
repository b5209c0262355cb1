//! # arena-ssn
//!
//! Sequence Sheet Notation for the Arena.
//!
//! A stimulus sheet is a spreadsheet of statements: column `A` holds the
//! output (or the value the row is expected to produce), column `B` the
//! operation and columns `C..` the inputs. Inputs are literals or references
//! to earlier cells.
//!
//! ## Flow
//!
//! 1. [`parse`] newline-delimited JSON records into [`ParsedSheet`]s.
//! 2. [`interpret`] a sheet against its abstractions into [`Invocations`].
//! 3. [`bind`] the invocations to an
//!    [`AdaptedImplementation`](arena_adapter::AdaptedImplementation),
//!    producing an [`AdapterSheet`].
//! 4. [`SheetRunner::run`] the adapter sheet under a per-statement deadline,
//!    producing an [`ActuationSheet`] index-aligned with the stimulus.

#![deny(unsafe_code)]

pub mod actuation;
pub mod adapter_sheet;
pub mod coordinate;
pub mod error;
pub mod interpreter;
pub mod literal;
pub mod parser;
pub mod runner;
pub mod sheet;

pub use actuation::{ActuationSheet, ExecutedOperation, OracleSummary, Outcome};
pub use adapter_sheet::{bind, AdapterSheet, BoundOperation, BoundStatement};
pub use coordinate::{column_name, is_coordinate, resolve_cell_reference, to_coordinate};
pub use error::{FormatError, ResolutionError, SsnError, SsnResult};
pub use interpreter::{interpret, Input, Invocation, Invocations, StatementKind};
pub use literal::{decode_literal, expected_matches, MAX_ARRAY_LENGTH};
pub use parser::{parse, parse_lines, parse_sheet, SheetRecord};
pub use runner::{run, SheetRunner, DEFAULT_TIMEOUT};
pub use sheet::{ParsedCell, ParsedRow, ParsedSheet, StimulusSheet};
