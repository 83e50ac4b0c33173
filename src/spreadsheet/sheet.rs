use crate::error::SheetSqlError;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::reference::CellRange;
use crate::spreadsheet::SpreadsheetError;
use crate::spreadsheet::Worksheet;
use std::collections::HashMap;

/// A worksheet held fully in memory.
#[derive(Clone, Debug, Default)]
pub struct Sheet {
    /// Sheet name as listed in the workbook
    pub name: String,
    /// Stored cells keyed by `(row, col)`
    cells: HashMap<(usize, usize), CellValue>,
    /// Merged ranges not released yet
    merged: Vec<CellRange>,
    /// Bounds of every stored cell, including valueless styled cells
    used: Option<CellRange>,
}

impl Sheet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }

    /// Stores a cell read from the workbook.
    ///
    /// Empty values are not kept but still count toward the used range.
    pub(crate) fn push(&mut self, row: usize, col: usize, value: CellValue) {
        self.extend_used_range(row, col);
        if value.is_empty() {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), value);
        }
    }

    pub(crate) fn push_merged_range(&mut self, range: CellRange) {
        self.merged.push(range);
    }

    /// True when the workbook declared no cell at all for this sheet.
    pub fn is_empty(&self) -> bool {
        self.used.is_none()
    }

    fn extend_used_range(&mut self, row: usize, col: usize) {
        self.used = Some(match self.used {
            None => CellRange::new(col, row, col, row),
            Some(used) => CellRange::new(
                used.start_col.min(col),
                used.start_row.min(row),
                used.end_col.max(col),
                used.end_row.max(row),
            ),
        });
    }

    /// The merged range covering a cell other than its top-left anchor.
    fn locking_range(&self, row: usize, col: usize) -> Option<&CellRange> {
        self.merged
            .iter()
            .find(|range| range.contains(row, col) && (range.start_row, range.start_col) != (row, col))
    }
}

impl Worksheet for Sheet {
    fn merged_ranges(&self) -> Vec<CellRange> {
        self.merged.clone()
    }

    fn unmerge(&mut self, range: &CellRange) -> Result<(), SheetSqlError> {
        let position = self
            .merged
            .iter()
            .position(|merged| merged == range)
            .ok_or_else(|| SpreadsheetError::MergedRangeNotFound(range.to_string()))?;
        self.merged.remove(position);
        Ok(())
    }

    fn read(&self, row: usize, col: usize) -> Result<CellValue, SheetSqlError> {
        if self.locking_range(row, col).is_some() {
            return Ok(CellValue::Empty);
        }
        Ok(self.cells.get(&(row, col)).cloned().unwrap_or_default())
    }

    fn write(&mut self, row: usize, col: usize, value: CellValue) -> Result<(), SheetSqlError> {
        if let Some(range) = self.locking_range(row, col) {
            Err(SpreadsheetError::CellLockedError {
                reference: index_to_reference(row, col),
                range: range.to_string(),
            })?
        }
        self.push(row, col, value);
        Ok(())
    }

    fn used_range(&self) -> Option<CellRange> {
        self.used
    }
}
