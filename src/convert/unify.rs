use crate::convert::extract::FileTable;
use crate::database::table::RowRecord;
use crate::error::ResultMessage;
use crate::error::SheetSqlError;
use crate::spreadsheet::cell::CellValue;
use regex::Regex;
use std::collections::HashMap;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

/// Workbook extensions picked up from a source directory.
const WORKBOOK_EXTENSIONS: [&str; 2] = ["xlsx", "xlsm"];

/// A workbook selected for conversion.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// File name, or the part captured by the filename pattern
    pub label: String,
}

/// Lists the workbooks of a directory in file name order.
///
/// Only regular files with an `.xlsx`/`.xlsm` extension (any case) are listed. With a pattern,
/// file names must match it from their start; a participating capture group gives the label,
/// otherwise the label is the whole file name.
pub fn enumerate_files(directory: &Path, pattern: Option<&Regex>) -> Result<Vec<SourceFile>, SheetSqlError> {
    let prefix = directory.display().to_string();
    let mut files = Vec::new();
    for entry in fs::read_dir(directory).map_err(SheetSqlError::from).with_prefix(&prefix)? {
        let path = entry.map_err(SheetSqlError::from).with_prefix(&prefix)?.path();
        if !path.is_file() || !is_workbook(&path) {
            continue;
        }
        let file_name = match path.file_name().and_then(|name| name.to_str()) {
            Some(file_name) => file_name.to_owned(),
            None => continue,
        };
        let label = match pattern {
            None => file_name.to_owned(),
            Some(pattern) => match pattern.captures(&file_name) {
                None => continue,
                Some(captures) => captures
                    .get(1)
                    .map(|group| group.as_str().to_owned())
                    .unwrap_or_else(|| file_name.to_owned()),
            },
        };
        files.push((file_name, SourceFile { path, label }));
    }
    files.sort_by(|(left, _), (right, _)| left.cmp(right));
    Ok(files.into_iter().map(|(_, file)| file).collect())
}

fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| {
            WORKBOOK_EXTENSIONS
                .iter()
                .any(|known| extension.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Accumulates the master schema over the files of one run.
///
/// Columns keep the order in which they were first seen; the first non-empty sample of a
/// column is never replaced.
#[derive(Debug, Default)]
pub struct Unifier {
    columns: Vec<String>,
    known: HashSet<String>,
    samples: HashMap<String, CellValue>,
    rows: Vec<RowRecord>,
    files: usize,
}

impl Unifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds the extraction of one file into the schema.
    pub fn add(&mut self, table: FileTable) {
        for column in table.header {
            if self.known.insert(column.to_owned()) {
                self.columns.push(column);
            }
        }
        for (column, sample) in table.samples {
            self.samples.entry(column).or_insert(sample);
        }
        self.rows.extend(table.rows);
        self.files += 1;
    }

    /// Number of files folded so far.
    pub fn files(&self) -> usize {
        self.files
    }

    /// Ends the run: `None` when no file contributed.
    pub fn finish(self) -> Option<MasterSchema> {
        if self.files == 0 {
            return None;
        }
        Some(MasterSchema {
            columns: self.columns,
            samples: self.samples,
            rows: self.rows,
        })
    }
}

/// Union of the columns of every file, with their samples and all rows.
#[derive(Clone, Debug, PartialEq)]
pub struct MasterSchema {
    pub columns: Vec<String>,
    pub samples: HashMap<String, CellValue>,
    pub rows: Vec<RowRecord>,
}
