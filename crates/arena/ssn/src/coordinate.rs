//! Cell coordinates: column letters in bijective base 26 followed by a
//! 1-based row number (`A1`, `Z9`, `AA10`).

use std::sync::OnceLock;

use regex::Regex;

use crate::error::FormatError;

const COORDINATE_PATTERN: &str = r"^([A-Z]+)([0-9]+)$";

fn pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(COORDINATE_PATTERN).ok())
        .as_ref()
}

/// Whether `s` has the shape of a coordinate. Says nothing about whether the
/// cell exists.
pub fn is_coordinate(s: &str) -> bool {
    pattern().is_some_and(|re| re.is_match(s))
}

/// `(row, column)`, both 0-based. `B3` is `(2, 1)`. Row numbers with a
/// leading zero (`A01`) are rejected, so every accepted coordinate is the
/// [`to_coordinate`] rendering of its result.
pub fn resolve_cell_reference(coordinate: &str) -> Result<(usize, usize), FormatError> {
    let bad = || FormatError::BadCoordinate(coordinate.to_string());
    let caps = pattern()
        .and_then(|re| re.captures(coordinate))
        .ok_or_else(bad)?;

    let mut column: usize = 0;
    for letter in caps[1].bytes() {
        let digit = usize::from(letter - b'A' + 1);
        column = column
            .checked_mul(26)
            .and_then(|c| c.checked_add(digit))
            .ok_or_else(bad)?;
    }
    let digits = &caps[2];
    if digits.starts_with('0') {
        return Err(bad());
    }
    let row: usize = digits.parse().map_err(|_| bad())?;
    if row == 0 {
        return Err(bad());
    }
    Ok((row - 1, column - 1))
}

/// Inverse of [`resolve_cell_reference`].
pub fn to_coordinate(row: usize, column: usize) -> String {
    format!("{}{}", column_name(column), row as u128 + 1)
}

/// Letters of a 0-based column index (`0` is `A`, `26` is `AA`).
pub fn column_name(column: usize) -> String {
    let mut n = column as u128 + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push(char::from(b'A' + rem));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_coordinates() {
        assert_eq!(resolve_cell_reference("A1").unwrap(), (0, 0));
        assert_eq!(resolve_cell_reference("B3").unwrap(), (2, 1));
        assert_eq!(resolve_cell_reference("Z1").unwrap(), (0, 25));
        assert_eq!(resolve_cell_reference("AA1").unwrap(), (0, 26));
        assert_eq!(resolve_cell_reference("AZ10").unwrap(), (9, 51));
        assert_eq!(resolve_cell_reference("BA2").unwrap(), (1, 52));
    }

    #[test]
    fn inverse_mapping() {
        assert_eq!(to_coordinate(0, 0), "A1");
        assert_eq!(to_coordinate(2, 1), "B3");
        assert_eq!(to_coordinate(0, 26), "AA1");
        assert_eq!(to_coordinate(9, 701), "ZZ10");
        assert_eq!(to_coordinate(0, 702), "AAA1");
    }

    #[test]
    fn malformed_rejected() {
        for bad in ["", "a1", "A", "1", "A0", "A-1", "A1B", " A1", "Ä1"] {
            assert!(resolve_cell_reference(bad).is_err(), "{bad}");
            if bad != "A0" {
                assert!(!is_coordinate(bad), "{bad}");
            }
        }
        assert!(is_coordinate("A0"));
    }

    #[test]
    fn leading_zero_rows_rejected() {
        for bad in ["A01", "B007", "AA00"] {
            assert!(matches!(
                resolve_cell_reference(bad),
                Err(FormatError::BadCoordinate(_))
            ));
        }
        assert_eq!(resolve_cell_reference("A10").unwrap(), (9, 0));
    }

    #[test]
    fn overflow_rejected() {
        let long = format!("{}1", "Z".repeat(40));
        assert!(matches!(
            resolve_cell_reference(&long),
            Err(FormatError::BadCoordinate(_))
        ));
        assert!(resolve_cell_reference("A99999999999999999999999999").is_err());
    }
}
