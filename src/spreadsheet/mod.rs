//! # Spreadsheet Module
//!
//! Reads `.xlsx`/`.xlsm` workbooks into in-memory worksheets and normalizes their
//! merged cells. Worksheets are accessed through the [`Worksheet`] trait so the
//! conversion pipeline never depends on the file format.

pub mod cell;
pub(crate) mod excel;
pub mod merge;
pub mod reference;
pub mod sheet;
pub mod xlsx;

use crate::error::SheetSqlError;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::reference::CellRange;
use thiserror::Error;

/// Errors raised while reading or editing workbooks.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Missing part '{0}' in workbook")]
    FileError(String),

    #[error("Workbook '{0}' contains no worksheets")]
    SpreadsheetEmptyError(String),

    #[error("Invalid value at {sheet}!{reference}: {message}")]
    CellValueError {
        sheet: String,
        reference: String,
        message: String,
    },

    #[error("Cell {reference} is read-only, it belongs to merged range {range}")]
    CellLockedError { reference: String, range: String },

    #[error("Merged range {0} does not exist")]
    MergedRangeNotFound(String),
}

/// Random access to the cells of one worksheet.
///
/// Row and column indexes are zero-based.
pub trait Worksheet {
    /// Merged ranges currently defined on the sheet.
    fn merged_ranges(&self) -> Vec<CellRange>;

    /// Releases a merged range, its cells become independently writable.
    fn unmerge(&mut self, range: &CellRange) -> Result<(), SheetSqlError>;

    /// Reads a cell, [`CellValue::Empty`] when nothing is stored there.
    fn read(&self, row: usize, col: usize) -> Result<CellValue, SheetSqlError>;

    /// Stores a value in a cell.
    fn write(&mut self, row: usize, col: usize, value: CellValue) -> Result<(), SheetSqlError>;

    /// Smallest rectangle holding every stored cell, `None` for a sheet without cells.
    fn used_range(&self) -> Option<CellRange>;
}
