use crate::spreadsheet::cell::CellValue;

/// Default text placed between the parts of a multi-row header.
pub const DEFAULT_HEADER_JOINER: &str = " - ";

/// Collapses the first `header_rows` rows of a grid into one raw label per column.
///
/// Blank cells become `col{row}_c{col}` (1-based, relative to the grid); other values are
/// rendered as text and trimmed. The parts of a column are joined with `joiner`.
/// The grid must hold at least `header_rows` rows; with `0` header rows every label is empty.
pub fn combine_header(rows: &[Vec<CellValue>], header_rows: usize, joiner: &str) -> Vec<String> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    (0..width)
        .map(|col| {
            rows.iter()
                .take(header_rows)
                .enumerate()
                .map(|(row, cells)| match cells.get(col) {
                    Some(value) if !value.is_blank() => value.to_string().trim().to_owned(),
                    _ => format!("col{}_c{}", row + 1, col + 1),
                })
                .collect::<Vec<String>>()
                .join(joiner)
        })
        .collect()
}
