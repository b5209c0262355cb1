//! Resolution of a parsed sheet into an invocation graph.
//!
//! Rows are processed in order. Every input is either a literal or a
//! reference to the output of an earlier row, so the result is a DAG whose
//! edges always point backwards.

use std::collections::BTreeMap;
use std::sync::Arc;

use arena_types::{InterfaceSpecification, TypeName};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::coordinate::resolve_cell_reference;
use crate::error::ResolutionError;
use crate::literal::{is_builtin, unquote};
use crate::sheet::{ParsedRow, ParsedSheet, OPERATION_COLUMN, OUTPUT_COLUMN};

const CREATE: &str = "create";
const VALUE: &str = "value";
const ARRAYSET: &str = "arrayset";

/// A statement input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Input {
    /// Undecoded JSON literal; decoded once the declared type is known.
    Literal(serde_json::Value),
    /// Output of the statement at this index.
    Ref(usize),
}

/// What a statement does.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatementKind {
    /// Instantiate the adapted candidate of abstraction `spec`.
    Create { spec: String },
    /// Create a built-in value.
    CreateBuiltin { type_name: TypeName },
    /// Call `method_index` of abstraction `spec`; input 0 is the receiver.
    Invoke {
        spec: String,
        method_index: usize,
        method: String,
    },
    /// Copy a literal or alias an earlier output.
    Value,
    /// `[array, index, value]`: store into an earlier array.
    ArraySet,
}

/// One resolved statement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    /// Position in the sheet, and in the actuation sheet.
    pub index: usize,
    /// 1-based row number.
    pub row: usize,
    /// Output coordinate (`A<row>`).
    pub output: String,
    /// The operation cell as written.
    pub operation: String,
    pub kind: StatementKind,
    /// Constructor or call arguments. For `Create` and `CreateBuiltin` the
    /// type name cell is not included.
    pub inputs: Vec<Input>,
    /// Column of each input, aligned with `inputs`.
    pub input_columns: Vec<usize>,
    /// Literal in column 0, if any.
    pub expected: Option<serde_json::Value>,
}

impl Invocation {
    /// Indices of the statements this one depends on.
    pub fn dependencies(&self) -> impl Iterator<Item = usize> + '_ {
        self.inputs.iter().filter_map(|i| match i {
            Input::Ref(r) => Some(*r),
            Input::Literal(_) => None,
        })
    }
}

/// The resolved statements of one sheet, in row order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Invocations {
    pub sheet: String,
    pub header: Option<String>,
    pub statements: Vec<Invocation>,
}

impl Invocations {
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Invocation> {
        self.statements.iter()
    }
}

/// Resolve `sheet` against the abstractions in `specs`.
pub fn interpret(
    sheet: &ParsedSheet,
    specs: &BTreeMap<String, Arc<InterfaceSpecification>>,
) -> Result<Invocations, ResolutionError> {
    let mut resolver = Resolver {
        sheet,
        specs,
        resolved_inputs: Vec::with_capacity(sheet.rows.len()),
    };
    let mut statements = Vec::with_capacity(sheet.rows.len());
    for (index, row) in sheet.rows.iter().enumerate() {
        statements.push(resolver.statement(index, row)?);
    }
    debug!(sheet = %sheet.name, statements = statements.len(), "Interpreted sheet");
    Ok(Invocations {
        sheet: sheet.name.clone(),
        header: sheet.header.clone(),
        statements,
    })
}

struct Resolver<'a> {
    sheet: &'a ParsedSheet,
    specs: &'a BTreeMap<String, Arc<InterfaceSpecification>>,
    /// Per statement: every input cell as `(column, input)`, type name cells
    /// included, so later rows can reference input cells.
    resolved_inputs: Vec<Vec<(usize, Input)>>,
}

impl<'a> Resolver<'a> {
    fn statement(&mut self, index: usize, row: &ParsedRow) -> Result<Invocation, ResolutionError> {
        let sheet_name = || self.sheet.name.clone();
        let operation = row
            .operation()
            .and_then(|c| c.value.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ResolutionError::MissingOperation {
                sheet: sheet_name(),
                row: row.number,
            })?
            .to_string();

        let mut cells = Vec::new();
        for cell in row.inputs() {
            let input = match cell.reference() {
                Some(reference) => self.reference(index, row.number, reference)?,
                None => Input::Literal(cell.value.clone()),
            };
            cells.push((cell.column, input));
        }

        let expected = row
            .output()
            .filter(|c| !c.is_value_reference && !c.value.is_null())
            .map(|c| c.value.clone());

        let marker = operation.to_ascii_lowercase();
        let (kind, skip) = match marker.as_str() {
            CREATE => (self.create_kind(row, &cells)?, 1),
            VALUE => (StatementKind::Value, 0),
            ARRAYSET => {
                if cells.len() != 3 {
                    return Err(ResolutionError::MalformedArraySet {
                        sheet: sheet_name(),
                        row: row.number,
                        inputs: cells.len(),
                    });
                }
                (StatementKind::ArraySet, 0)
            }
            _ => (self.invoke_kind(row, &operation, cells.len())?, 0),
        };

        let (input_columns, inputs): (Vec<usize>, Vec<Input>) = cells.iter().skip(skip).cloned().unzip();
        self.resolved_inputs.push(cells);

        Ok(Invocation {
            index,
            row: row.number,
            output: row.output_coordinate(),
            operation,
            kind,
            inputs,
            input_columns,
            expected,
        })
    }

    fn reference(&self, current: usize, row: usize, reference: &str) -> Result<Input, ResolutionError> {
        let forward = || ResolutionError::ForwardReference {
            sheet: self.sheet.name.clone(),
            row,
            reference: reference.to_string(),
        };
        // the parser only flags existing, well-formed coordinates
        let (ref_row, ref_col) = resolve_cell_reference(reference).map_err(|_| forward())?;
        let position = self.sheet.position_of_row(ref_row + 1).ok_or_else(forward)?;
        if position >= current {
            return Err(forward());
        }
        match ref_col {
            OUTPUT_COLUMN => Ok(Input::Ref(position)),
            OPERATION_COLUMN => Err(ResolutionError::OperationCellReference {
                sheet: self.sheet.name.clone(),
                row,
                reference: reference.to_string(),
            }),
            column => self.resolved_inputs[position]
                .iter()
                .find(|(c, _)| *c == column)
                .map(|(_, input)| input.clone())
                .ok_or_else(forward),
        }
    }

    fn create_kind(
        &self,
        row: &ParsedRow,
        cells: &[(usize, Input)],
    ) -> Result<StatementKind, ResolutionError> {
        let missing = || ResolutionError::MissingTypeName {
            sheet: self.sheet.name.clone(),
            row: row.number,
        };
        let raw = match cells.first() {
            Some((_, Input::Literal(serde_json::Value::String(s)))) => unquote(s).trim(),
            _ => return Err(missing()),
        };
        if raw.is_empty() {
            return Err(missing());
        }
        if self.specs.contains_key(raw) {
            return Ok(StatementKind::Create {
                spec: raw.to_string(),
            });
        }
        let type_name = TypeName::new(raw);
        if is_builtin(&type_name) {
            Ok(StatementKind::CreateBuiltin { type_name })
        } else {
            Err(ResolutionError::UnknownType {
                sheet: self.sheet.name.clone(),
                row: row.number,
                type_name: raw.to_string(),
            })
        }
    }

    fn invoke_kind(
        &self,
        row: &ParsedRow,
        operation: &str,
        inputs: usize,
    ) -> Result<StatementKind, ResolutionError> {
        let arity = inputs.saturating_sub(1);
        let found = (inputs > 0)
            .then(|| {
                self.specs.values().find_map(|spec| {
                    spec.find_method(operation, arity)
                        .map(|(i, m)| (spec.name().to_string(), i, m.name.clone()))
                })
            })
            .flatten();
        match found {
            Some((spec, method_index, method)) => Ok(StatementKind::Invoke {
                spec,
                method_index,
                method,
            }),
            None => Err(ResolutionError::UnknownOperation {
                sheet: self.sheet.name.clone(),
                row: row.number,
                operation: operation.to_string(),
                arity,
            }),
        }
    }
}
