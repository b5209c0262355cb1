//! SSN errors.
//!
//! Format and resolution errors are input errors: they abort the parse or
//! the interpretation of a sheet. Per-statement failures are not errors here;
//! they are recorded in the actuation sheet.

use thiserror::Error;

/// Malformed SSN input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("line {line}: invalid JSON: {message}")]
    Json { line: usize, message: String },

    #[error("record {record}: expected a JSON object")]
    NotAnObject { record: usize },

    #[error("record {record}: missing or non-string 'sheet'")]
    MissingSheet { record: usize },

    #[error("record {record} of sheet '{sheet}': missing or non-object 'cells'")]
    MissingCells { record: usize, sheet: String },

    #[error("invalid cell coordinate '{0}'")]
    BadCoordinate(String),

    #[error("no sheet records")]
    Empty,

    #[error("expected a single sheet, found '{first}' and '{second}'")]
    MultipleSheets { first: String, second: String },
}

/// A sheet whose statements cannot be resolved into an invocation graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("sheet '{sheet}' row {row}: reference to {reference} does not precede the current row")]
    ForwardReference {
        sheet: String,
        row: usize,
        reference: String,
    },

    #[error("sheet '{sheet}' row {row}: {reference} is an operation cell and cannot be referenced")]
    OperationCellReference {
        sheet: String,
        row: usize,
        reference: String,
    },

    #[error("sheet '{sheet}' row {row}: unknown operation '{operation}' with {arity} argument(s)")]
    UnknownOperation {
        sheet: String,
        row: usize,
        operation: String,
        arity: usize,
    },

    #[error("sheet '{sheet}' row {row}: missing operation")]
    MissingOperation { sheet: String, row: usize },

    #[error("sheet '{sheet}' row {row}: CREATE needs a literal type name as its first input")]
    MissingTypeName { sheet: String, row: usize },

    #[error("sheet '{sheet}' row {row}: cannot create unknown type '{type_name}'")]
    UnknownType {
        sheet: String,
        row: usize,
        type_name: String,
    },

    #[error("sheet '{sheet}' row {row}: ARRAYSET expects [array, index, value], got {inputs} input(s)")]
    MalformedArraySet {
        sheet: String,
        row: usize,
        inputs: usize,
    },
}

/// Any SSN error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SsnError {
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    #[error("resolution error: {0}")]
    Resolution(#[from] ResolutionError),
}

pub type SsnResult<T> = Result<T, SsnError>;
