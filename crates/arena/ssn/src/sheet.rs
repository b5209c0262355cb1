//! Parsed sheets and stimulus sheets.

use std::collections::BTreeMap;
use std::sync::Arc;

use arena_types::InterfaceSpecification;
use serde::{Deserialize, Serialize};

use crate::coordinate::to_coordinate;
use crate::error::ResolutionError;
use crate::interpreter::{interpret, Invocations};

/// Column holding the output binding or expected value.
pub const OUTPUT_COLUMN: usize = 0;
/// Column holding the operation name or marker.
pub const OPERATION_COLUMN: usize = 1;
/// First positional input column.
pub const FIRST_INPUT_COLUMN: usize = 2;

/// One cell of a sheet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParsedCell {
    pub key: String,
    /// 0-based row.
    pub row: usize,
    /// 0-based column.
    pub column: usize,
    pub value: serde_json::Value,
    /// The value names another cell of the same sheet.
    pub is_value_reference: bool,
}

impl ParsedCell {
    /// The referenced coordinate, when this cell is a reference.
    pub fn reference(&self) -> Option<&str> {
        if self.is_value_reference {
            self.value.as_str()
        } else {
            None
        }
    }
}

/// One row; cells are ordered by column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParsedRow {
    /// 1-based row number as written in the coordinates.
    pub number: usize,
    pub cells: Vec<ParsedCell>,
}

impl ParsedRow {
    pub fn cell(&self, column: usize) -> Option<&ParsedCell> {
        self.cells.iter().find(|c| c.column == column)
    }

    pub fn output(&self) -> Option<&ParsedCell> {
        self.cell(OUTPUT_COLUMN)
    }

    pub fn operation(&self) -> Option<&ParsedCell> {
        self.cell(OPERATION_COLUMN)
    }

    /// Positional inputs, in column order.
    pub fn inputs(&self) -> impl Iterator<Item = &ParsedCell> {
        self.cells.iter().filter(|c| c.column >= FIRST_INPUT_COLUMN)
    }

    /// Coordinate of the output cell (`A<row>`).
    pub fn output_coordinate(&self) -> String {
        to_coordinate(self.number - 1, OUTPUT_COLUMN)
    }
}

/// A sheet as parsed from the wire format; rows ordered by number.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParsedSheet {
    pub name: String,
    pub header: Option<String>,
    pub rows: Vec<ParsedRow>,
}

impl ParsedSheet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position in `rows` of the row numbered `number`.
    pub fn position_of_row(&self, number: usize) -> Option<usize> {
        self.rows.binary_search_by_key(&number, |r| r.number).ok()
    }

    /// Cell at 0-based `(row, column)`.
    pub fn cell_at(&self, row: usize, column: usize) -> Option<&ParsedCell> {
        self.position_of_row(row + 1)
            .and_then(|p| self.rows[p].cell(column))
    }

    pub fn contains(&self, row: usize, column: usize) -> bool {
        self.cell_at(row, column).is_some()
    }

    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).sum()
    }
}

/// A parsed sheet together with the abstractions it was written against.
/// Immutable.
#[derive(Clone, Debug)]
pub struct StimulusSheet {
    sheet: ParsedSheet,
    specs: BTreeMap<String, Arc<InterfaceSpecification>>,
}

impl StimulusSheet {
    pub fn new(
        sheet: ParsedSheet,
        specs: impl IntoIterator<Item = Arc<InterfaceSpecification>>,
    ) -> Self {
        let specs = specs
            .into_iter()
            .map(|s| (s.name().to_string(), s))
            .collect();
        Self { sheet, specs }
    }

    pub fn sheet(&self) -> &ParsedSheet {
        &self.sheet
    }

    pub fn name(&self) -> &str {
        &self.sheet.name
    }

    pub fn specs(&self) -> &BTreeMap<String, Arc<InterfaceSpecification>> {
        &self.specs
    }

    pub fn spec(&self, name: &str) -> Option<&Arc<InterfaceSpecification>> {
        self.specs.get(name)
    }

    /// Resolve the sheet into its invocation graph.
    pub fn interpret(&self) -> Result<Invocations, ResolutionError> {
        interpret(&self.sheet, &self.specs)
    }
}
