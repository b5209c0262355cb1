//! Actuation sheets: what a candidate did with a stimulus sheet.

use std::time::Duration;

use arena_container::Fault;
use arena_types::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coordinate::to_coordinate;
use crate::literal::expected_matches;
use crate::parser::SheetRecord;
use crate::sheet::{OPERATION_COLUMN, OUTPUT_COLUMN};

/// Result of one executed statement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Value { value: Value },
    Fault { fault: Fault },
    /// The statement did not finish before its deadline.
    Timeout { deadline_ms: u64 },
}

impl Outcome {
    pub fn timeout(deadline: Duration) -> Self {
        Self::Timeout {
            deadline_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Value { value } => Some(value),
            _ => None,
        }
    }

    pub fn fault(&self) -> Option<&Fault> {
        match self {
            Self::Fault { fault } => Some(fault),
            _ => None,
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// How the outcome is written into the output cell.
    pub fn to_cell(&self) -> serde_json::Value {
        match self {
            Self::Value { value } => value.to_json(),
            Self::Fault { fault } => serde_json::Value::String(format!("!fault: {}", fault)),
            Self::Timeout { deadline_ms } => {
                serde_json::Value::String(format!("!timeout: {}ms", deadline_ms))
            }
        }
    }
}

impl From<Result<Value, Fault>> for Outcome {
    fn from(result: Result<Value, Fault>) -> Self {
        match result {
            Ok(value) => Self::Value { value },
            Err(fault) => Self::Fault { fault },
        }
    }
}

/// One executed statement, at the same index as its invocation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutedOperation {
    pub index: usize,
    /// 1-based row number.
    pub row: usize,
    pub operation: String,
    /// `(column, value)` of every input as actually passed. Inputs are
    /// empty when an upstream failure kept the statement from running.
    pub inputs: Vec<(usize, Value)>,
    pub outcome: Outcome,
    /// Literal the sheet expected in the output cell, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<serde_json::Value>,
    pub duration_nanos: u64,
}

impl ExecutedOperation {
    /// Oracle check; `None` when the row carries no expectation.
    pub fn matches_expected(&self) -> Option<bool> {
        let expected = self.expected.as_ref()?;
        Some(
            self.outcome
                .value()
                .is_some_and(|value| expected_matches(expected, value)),
        )
    }
}

/// Agreement of one actuation sheet with the expectations in its stimulus.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleSummary {
    pub checked: usize,
    pub matched: usize,
}

impl OracleSummary {
    pub fn all_matched(&self) -> bool {
        self.checked == self.matched
    }

    pub fn ratio(&self) -> f64 {
        if self.checked == 0 {
            1.0
        } else {
            self.matched as f64 / self.checked as f64
        }
    }
}

/// Outcome of running one adapter sheet. Operations are index-aligned with
/// the statements of the stimulus sheet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActuationSheet {
    pub sheet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    /// `Unit#rank` of the adapted implementation that ran.
    pub adapter: String,
    pub unit: String,
    pub executed_at: DateTime<Utc>,
    pub timeout_ms: u64,
    pub operations: Vec<ExecutedOperation>,
}

impl ActuationSheet {
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ExecutedOperation> {
        self.operations.get(index)
    }

    /// Operation executed for 1-based `row`.
    pub fn row(&self, row: usize) -> Option<&ExecutedOperation> {
        self.operations.iter().find(|o| o.row == row)
    }

    pub fn faults(&self) -> usize {
        self.operations
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Fault { .. }))
            .count()
    }

    pub fn timeouts(&self) -> usize {
        self.operations.iter().filter(|o| o.outcome.is_timeout()).count()
    }

    /// Every cell as `(row, column, value)`, 0-based: the outcome in the
    /// output column, the operation, then the inputs as passed.
    pub fn cells(&self) -> Vec<(usize, usize, serde_json::Value)> {
        let mut cells = Vec::new();
        for op in &self.operations {
            let row = op.row - 1;
            cells.push((row, OUTPUT_COLUMN, op.outcome.to_cell()));
            cells.push((
                row,
                OPERATION_COLUMN,
                serde_json::Value::String(op.operation.clone()),
            ));
            cells.extend(op.inputs.iter().map(|(col, v)| (row, *col, v.to_json())));
        }
        cells
    }

    /// The sheet in wire form, one record per row.
    pub fn to_records(&self) -> Vec<SheetRecord> {
        let mut records: Vec<SheetRecord> = Vec::with_capacity(self.operations.len());
        for (row, column, value) in self.cells() {
            let key = to_coordinate(row, column);
            match records.last_mut() {
                Some(last) if last_row(last) == Some(row) => {
                    last.cells.insert(key, value);
                }
                _ => {
                    let mut cells = serde_json::Map::new();
                    cells.insert(key, value);
                    records.push(SheetRecord {
                        sheet: self.sheet.clone(),
                        header: records.is_empty().then(|| self.header.clone()).flatten(),
                        cells,
                    });
                }
            }
        }
        records
    }

    /// Oracle check per operation.
    pub fn matches_expected(&self) -> Vec<Option<bool>> {
        self.operations.iter().map(ExecutedOperation::matches_expected).collect()
    }

    pub fn oracle_summary(&self) -> OracleSummary {
        self.matches_expected()
            .into_iter()
            .flatten()
            .fold(OracleSummary::default(), |mut acc, matched| {
                acc.checked += 1;
                acc.matched += usize::from(matched);
                acc
            })
    }

    pub fn total_duration(&self) -> Duration {
        Duration::from_nanos(self.operations.iter().map(|o| o.duration_nanos).sum())
    }
}

fn last_row(record: &SheetRecord) -> Option<usize> {
    record
        .cells
        .keys()
        .next()
        .and_then(|k| crate::coordinate::resolve_cell_reference(k).ok())
        .map(|(row, _)| row)
}
