//! # Conversion Pipeline
//!
//! Drives extraction over every selected workbook, unifies their columns into one schema
//! and types it, producing everything a [`TableSink`](crate::sink::TableSink) needs.

pub mod extract;
pub mod header;
pub mod unify;

use crate::config::Config;
use crate::config::ConfigError;
use crate::convert::extract::extract_file;
use crate::convert::extract::ExtraColumn;
use crate::convert::extract::ExtractOptions;
use crate::convert::extract::Extraction;
use crate::convert::unify::enumerate_files;
use crate::convert::unify::SourceFile;
use crate::convert::unify::Unifier;
use crate::database::table::RowRecord;
use crate::database::table::TableDefinition;
use crate::error::SheetSqlError;
use std::path::Path;
use tracing::debug;
use tracing::info;
use tracing::warn;

/// Outcome of a conversion run.
#[derive(Clone, Debug, PartialEq)]
pub enum Conversion {
    /// No workbook was selected, or every one was skipped
    Empty,
    Table {
        definition: TableDefinition,
        rows: Vec<RowRecord>,
    },
}

/// Converts the configured workbooks into one typed table.
///
/// With `directory` set every matching workbook of it is merged; otherwise `input` is the
/// only workbook. Skipped files are logged and left out.
pub fn run(config: &Config, input: Option<&Path>) -> Result<Conversion, SheetSqlError> {
    let sources = select_sources(config, input)?;
    let options = ExtractOptions::from_config(config);

    let mut unifier = Unifier::new();
    for source in &sources {
        let extra = config
            .filename_column_name
            .as_deref()
            .map(|name| ExtraColumn::new(name, &source.label));
        match extract_file(&source.path, &options, extra.as_ref())? {
            Extraction::Table(table) => {
                info!("Read {} rows from '{}'", table.rows.len(), source.path.display());
                unifier.add(table);
            }
            Extraction::Skipped(reason) => warn!("Skip '{}': {reason}", source.path.display()),
        }
    }

    let schema = match unifier.finish() {
        Some(schema) => schema,
        None => return Ok(Conversion::Empty),
    };
    info!(
        "Table '{}' has {} columns and {} rows",
        config.table_name,
        schema.columns.len(),
        schema.rows.len()
    );
    let definition = TableDefinition::new(
        &config.table_name,
        &schema.columns,
        &schema.samples,
        config.type_approach,
    );
    Ok(Conversion::Table {
        definition,
        rows: schema.rows,
    })
}

fn select_sources(config: &Config, input: Option<&Path>) -> Result<Vec<SourceFile>, SheetSqlError> {
    if let Some(directory) = &config.directory {
        if let Some(input) = input {
            debug!("Ignore input '{}', reading directory '{}'", input.display(), directory.display());
        }
        let sources = enumerate_files(directory, config.filename_regex()?.as_ref())?;
        if sources.is_empty() {
            warn!("No workbook selected in '{}'", directory.display());
        }
        return Ok(sources);
    }
    let path = input.ok_or(ConfigError::MissingInput)?;
    let label = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(vec![SourceFile {
        path: path.to_path_buf(),
        label,
    }])
}
