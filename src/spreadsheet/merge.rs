//! Merged-cell flattening: every cell of a merged range receives the value of the range's top-left cell.

use crate::error::ResultMessage;
use crate::error::SheetSqlError;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::Worksheet;
use tracing::debug;

/// Releases every merged range of a worksheet and copies the top-left value into each of its cells.
///
/// The range list is snapshotted before any change. Any read, unmerge or write failure
/// aborts with the range and cell that caused it.
pub fn flatten_merged_cells<W: Worksheet + ?Sized>(worksheet: &mut W) -> Result<(), SheetSqlError> {
    for range in worksheet.merged_ranges() {
        let (start_col, start_row, end_col, end_row) = range.bounds();
        let value = worksheet
            .read(start_row, start_col)
            .with_prefix(&format!("read {} of merged range {range}", index_to_reference(start_row, start_col)))?;
        worksheet
            .unmerge(&range)
            .with_prefix(&format!("unmerge {range}"))?;
        debug!("Flatten merged range {range} with value '{value}'");
        for row in start_row..=end_row {
            for col in start_col..=end_col {
                worksheet
                    .write(row, col, value.clone())
                    .with_prefix(&format!("write {} of merged range {range}", index_to_reference(row, col)))?;
            }
        }
    }
    Ok(())
}
