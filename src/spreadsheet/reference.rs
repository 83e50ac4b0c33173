//! Excel-style cell references (`A1`, `AB12`, `B2:F100`) and zero-based index conversions.

use std::fmt::Display;

/// Rows of a worksheet (`1048576`).
pub const MAX_ROWS: usize = 1_048_576;

/// Columns of a worksheet (`XFD`).
pub const MAX_COLUMNS: usize = 16_384;

/// A rectangle of cells, zero-based and inclusive on both axes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub start_col: usize,
    pub start_row: usize,
    pub end_col: usize,
    pub end_row: usize,
}

impl CellRange {
    /// Builds a range from two corners in any order.
    pub fn new(start_col: usize, start_row: usize, end_col: usize, end_row: usize) -> Self {
        CellRange {
            start_col: start_col.min(end_col),
            start_row: start_row.min(end_row),
            end_col: start_col.max(end_col),
            end_row: start_row.max(end_row),
        }
    }

    /// `(start_col, start_row, end_col, end_row)`
    pub fn bounds(&self) -> (usize, usize, usize, usize) {
        (self.start_col, self.start_row, self.end_col, self.end_row)
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.start_row <= row && row <= self.end_row && self.start_col <= col && col <= self.end_col
    }

    pub fn rows(&self) -> usize {
        self.end_row - self.start_row + 1
    }

    pub fn cols(&self) -> usize {
        self.end_col - self.start_col + 1
    }
}

impl Display for CellRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}",
            index_to_reference(self.start_row, self.start_col),
            index_to_reference(self.end_row, self.end_col)
        )
    }
}

/// Converts column letters to a zero-based index: `A` → 0, `Z` → 25, `AA` → 26.
///
/// Letters are read as a bijective base-26 numeral (digits 1..=26, no zero).
/// Returns `None` for an empty string, any non-letter character or a column past `XFD`.
pub fn col_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut number = 0usize;
    for letter in letters.chars() {
        if !letter.is_ascii_alphabetic() {
            return None;
        }
        let digit = (letter.to_ascii_uppercase() as usize) - ('A' as usize) + 1;
        number = number.checked_mul(26)?.checked_add(digit)?;
        if number > MAX_COLUMNS {
            return None;
        }
    }
    Some(number - 1)
}

/// Converts a 1-based row number to a zero-based index; `0`, rows past [`MAX_ROWS`] and
/// non-numbers are rejected.
pub fn row_to_index(number: &str) -> Option<usize> {
    number
        .parse::<usize>()
        .ok()
        .filter(|row| (1..=MAX_ROWS).contains(row))
        .map(|row| row - 1)
}

/// Converts a zero-based column index back to letters: 0 → `A`, 26 → `AA`.
pub fn index_to_col(col: usize) -> String {
    let mut number = col + 1;
    let mut letters = Vec::new();
    while number > 0 {
        number -= 1;
        letters.push((b'A' + (number % 26) as u8) as char);
        number /= 26;
    }
    letters.iter().rev().collect()
}

/// Formats a zero-based `(row, col)` as an A1 reference.
pub fn index_to_reference(row: usize, col: usize) -> String {
    format!("{}{}", index_to_col(col), row + 1)
}

/// Parses an A1 reference into zero-based `(row, col)`.
pub fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let split = reference
        .find(|c: char| c.is_ascii_digit())
        .filter(|index| *index > 0)?;
    let col = col_to_index(&reference[..split])?;
    let row = row_to_index(&reference[split..])?;
    Some((row, col))
}

/// Parses `A1:B2` (or a lone `A1`) into a [`CellRange`].
pub fn parse_range_reference(reference: &str) -> Option<CellRange> {
    let (first, last) = reference.split_once(':').unwrap_or((reference, reference));
    let (start_row, start_col) = reference_to_index(first)?;
    let (end_row, end_col) = reference_to_index(last)?;
    Some(CellRange::new(start_col, start_row, end_col, end_row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters() {
        assert_eq!(col_to_index("A"), Some(0));
        assert_eq!(col_to_index("Z"), Some(25));
        assert_eq!(col_to_index("AA"), Some(26));
        assert_eq!(col_to_index("AB"), Some(27));
        assert_eq!(col_to_index("ab"), Some(27));
        assert_eq!(col_to_index("XFD"), Some(16_383));
        assert_eq!(col_to_index(""), None);
        assert_eq!(col_to_index("A1"), None);
        assert_eq!(col_to_index("XFE"), None);
        assert_eq!(col_to_index("ZZZZZZZZZZZZZZZZ"), None);
    }

    #[test]
    fn column_letters_back_and_forth() {
        for index in [0, 25, 26, 51, 52, 701, 702, 16_383] {
            assert_eq!(col_to_index(&index_to_col(index)), Some(index));
        }
        assert_eq!(index_to_col(27), "AB");
    }

    #[test]
    fn rows() {
        assert_eq!(row_to_index("1"), Some(0));
        assert_eq!(row_to_index("100"), Some(99));
        assert_eq!(row_to_index("0"), None);
        assert_eq!(row_to_index("x"), None);
        assert_eq!(row_to_index("1048576"), Some(1_048_575));
        assert_eq!(row_to_index("1048577"), None);
        assert_eq!(row_to_index("18446744073709551615"), None);
    }

    #[test]
    fn references() {
        assert_eq!(reference_to_index("A1"), Some((0, 0)));
        assert_eq!(reference_to_index("AB12"), Some((11, 27)));
        assert_eq!(reference_to_index("12"), None);
        assert_eq!(reference_to_index("B"), None);
        assert_eq!(index_to_reference(99, 5), "F100");
    }

    #[test]
    fn range_references() {
        let range = parse_range_reference("P19:P17").unwrap();
        assert_eq!(range.bounds(), (15, 16, 15, 18));
        assert_eq!(range.to_string(), "P17:P19");
        assert_eq!(range.rows(), 3);
        assert_eq!(range.cols(), 1);

        let single = parse_range_reference("C3").unwrap();
        assert_eq!(single.bounds(), (2, 2, 2, 2));
        assert!(parse_range_reference("C3:").is_none());
    }
}
