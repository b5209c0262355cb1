//! Property tests for coordinates, record merging and resolution.

use std::collections::BTreeMap;

use arena_ssn::*;
use proptest::prelude::*;
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

/// Per row: `None` for a literal input, `Some(target)` for a reference to the
/// output cell of 0-based row `target`.
fn arb_rows() -> impl Strategy<Value = Vec<Option<usize>>> {
    (1usize..16).prop_flat_map(|n| proptest::collection::vec(proptest::option::of(0..n), n))
}

fn value_sheet(rows: &[Option<usize>]) -> ParsedSheet {
    let mut cells = serde_json::Map::new();
    for (i, input) in rows.iter().enumerate() {
        cells.insert(to_coordinate(i, 0), json!(null));
        cells.insert(to_coordinate(i, 1), json!("value"));
        let value = match input {
            Some(target) => json!(to_coordinate(*target, 0)),
            None => json!(i),
        };
        cells.insert(to_coordinate(i, 2), value);
    }
    parse_sheet(&[json!({"sheet": "p", "cells": cells})]).unwrap()
}

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn coordinates_round_trip(row in 0usize..1_000_000, column in 0usize..475_254) {
        let coordinate = to_coordinate(row, column);
        prop_assert!(is_coordinate(&coordinate));
        prop_assert_eq!(resolve_cell_reference(&coordinate).unwrap(), (row, column));
    }

    #[test]
    fn accepted_coordinates_render_back_exactly(coordinate in "[A-Z]{1,3}[0-9]{1,6}") {
        if let Ok((row, column)) = resolve_cell_reference(&coordinate) {
            prop_assert_eq!(to_coordinate(row, column), coordinate);
        }
    }

    #[test]
    fn column_letters_are_uppercase(column in 0usize..100_000) {
        let name = column_name(column);
        prop_assert!(!name.is_empty());
        prop_assert!(name.bytes().all(|b| b.is_ascii_uppercase()));
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn later_records_win(values in proptest::collection::vec(any::<i32>(), 1..8)) {
        let records: Vec<serde_json::Value> = values
            .iter()
            .map(|v| json!({"sheet": "s", "cells": {"A1": v}}))
            .collect();
        let sheet = parse_sheet(&records).unwrap();
        prop_assert_eq!(sheet.cell_count(), 1);
        prop_assert_eq!(&sheet.rows[0].cells[0].value, &json!(values[values.len() - 1]));
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn references_only_point_backwards(rows in arb_rows()) {
        let sheet = value_sheet(&rows);
        let all_backwards = rows
            .iter()
            .enumerate()
            .all(|(i, input)| input.map_or(true, |target| target < i));

        match interpret(&sheet, &BTreeMap::new()) {
            Ok(invocations) => {
                prop_assert!(all_backwards);
                prop_assert_eq!(invocations.len(), rows.len());
                for statement in invocations.iter() {
                    for dependency in statement.dependencies() {
                        prop_assert!(dependency < statement.index);
                    }
                }
            }
            Err(ResolutionError::ForwardReference { .. }) => prop_assert!(!all_backwards),
            Err(other) => prop_assert!(false, "unexpected error {}", other),
        }
    }
}
