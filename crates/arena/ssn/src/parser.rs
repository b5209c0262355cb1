//! SSN wire format parsing.
//!
//! The wire format is newline-delimited JSON; each record reads
//!
//! ```text
//! {"sheet": "<name>", "header": "<optional>", "cells": {"A1": null, "B1": "create", ...}}
//! ```
//!
//! Records of the same sheet are merged, later cells replacing earlier ones
//! at the same coordinate. Sheets keep the order of their first record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::coordinate::{is_coordinate, resolve_cell_reference};
use crate::error::FormatError;
use crate::sheet::{ParsedCell, ParsedRow, ParsedSheet};

/// One wire record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SheetRecord {
    pub sheet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    pub cells: serde_json::Map<String, serde_json::Value>,
}

#[derive(Default)]
struct SheetBuilder {
    header: Option<String>,
    cells: BTreeMap<(usize, usize), (String, serde_json::Value)>,
}

/// Parse records into sheets.
pub fn parse(records: &[serde_json::Value]) -> Result<Vec<ParsedSheet>, FormatError> {
    let mut order: Vec<String> = Vec::new();
    let mut builders: BTreeMap<String, SheetBuilder> = BTreeMap::new();

    for (index, record) in records.iter().enumerate() {
        let record_no = index + 1;
        let obj = record
            .as_object()
            .ok_or(FormatError::NotAnObject { record: record_no })?;
        let name = obj
            .get("sheet")
            .and_then(serde_json::Value::as_str)
            .ok_or(FormatError::MissingSheet { record: record_no })?;
        let cells = obj
            .get("cells")
            .and_then(serde_json::Value::as_object)
            .ok_or_else(|| FormatError::MissingCells {
                record: record_no,
                sheet: name.to_string(),
            })?;

        if !builders.contains_key(name) {
            order.push(name.to_string());
        }
        let builder = builders.entry(name.to_string()).or_default();
        if builder.header.is_none() {
            builder.header = obj
                .get("header")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string);
        }
        for (key, value) in cells {
            let position = resolve_cell_reference(key)?;
            builder.cells.insert(position, (key.clone(), value.clone()));
        }
    }

    let sheets: Vec<ParsedSheet> = order
        .into_iter()
        .filter_map(|name| builders.remove(&name).map(|b| build(name, b)))
        .collect();
    debug!(records = records.len(), sheets = sheets.len(), "Parsed SSN records");
    Ok(sheets)
}

/// Parse records that must all belong to one sheet.
pub fn parse_sheet(records: &[serde_json::Value]) -> Result<ParsedSheet, FormatError> {
    let mut sheets = parse(records)?.into_iter();
    let first = sheets.next().ok_or(FormatError::Empty)?;
    if let Some(second) = sheets.next() {
        return Err(FormatError::MultipleSheets {
            first: first.name,
            second: second.name,
        });
    }
    Ok(first)
}

/// Parse newline-delimited JSON. Blank lines are skipped.
pub fn parse_lines(text: &str) -> Result<Vec<ParsedSheet>, FormatError> {
    let records = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| FormatError::Json {
                line: i + 1,
                message: e.to_string(),
            })
        })
        .collect::<Result<Vec<serde_json::Value>, _>>()?;
    parse(&records)
}

fn build(name: String, builder: SheetBuilder) -> ParsedSheet {
    let present: Vec<(usize, usize)> = builder.cells.keys().copied().collect();
    let exists = |coord: &str| {
        resolve_cell_reference(coord)
            .map(|pos| present.binary_search(&pos).is_ok())
            .unwrap_or(false)
    };

    let mut rows: Vec<ParsedRow> = Vec::new();
    for ((row, column), (key, value)) in builder.cells {
        let is_value_reference = value.as_str().is_some_and(|s| is_coordinate(s) && exists(s));
        let cell = ParsedCell {
            key,
            row,
            column,
            value,
            is_value_reference,
        };
        match rows.last_mut() {
            Some(last) if last.number == row + 1 => last.cells.push(cell),
            _ => rows.push(ParsedRow {
                number: row + 1,
                cells: vec![cell],
            }),
        }
    }

    ParsedSheet {
        name,
        header: builder.header,
        rows,
    }
}
