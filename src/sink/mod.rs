//! # Table Sinks
//!
//! Destinations for a converted table. Both sinks consume the same definition and rows:
//! [`ScriptSink`] writes a SQL script, [`DuckDbSink`] loads an embedded database.

pub mod duckdb;
pub mod script;

pub use self::duckdb::DuckDbSink;
pub use self::script::ScriptSink;

use crate::database::table::RowRecord;
use crate::database::table::TableDefinition;
use crate::error::SheetSqlError;

/// Receives a table definition and all of its rows.
pub trait TableSink {
    /// Creates the table, replacing any table of the same name, and writes every row.
    fn write_table(&mut self, definition: &TableDefinition, rows: &[RowRecord]) -> Result<(), SheetSqlError>;
}
