//! # sheetsql
//!
//! Converts tables kept in spreadsheet workbooks into relational tables, either as a SQL
//! script or loaded straight into a DuckDB database, and merges many same-shaped workbooks
//! into one table.
//!
//! ## Features
//!
//! - **Workbook reading**: `.xlsx`/`.xlsm` files, shared and inline strings, date styles,
//!   1900 and 1904 date systems
//! - **Merged cells**: every cell of a merged range receives the range's top-left value
//! - **Headers**: one or more header rows joined into one label per column, turned into
//!   unique, lowercase, length-bounded SQL identifiers
//! - **Schema unification**: columns of many workbooks merged in first-seen order, missing
//!   values written as `NULL`
//! - **Typing**: everything as text, or numeric columns detected from a sample value
//! - **Sinks**: PostgreSQL scripts, or a DuckDB table written in a single transaction
//! - **Post-processing**: a directory of SQL scripts applied to the database in name order

pub mod config;
pub mod convert;
pub mod database;
pub mod error;
pub mod helpers;
pub mod logging;
pub mod runner;
pub mod sink;
pub mod spreadsheet;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::config::Config;
pub use crate::convert::run;
pub use crate::convert::Conversion;
pub use crate::error::SheetSqlError;
