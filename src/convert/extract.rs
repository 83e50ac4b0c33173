use crate::config::Config;
use crate::convert::header::combine_header;
use crate::database::column::TypeApproach;
use crate::database::identifier::finalize;
use crate::database::range::parse_region;
use crate::database::table::RowRecord;
use crate::error::ResultMessage;
use crate::error::SheetSqlError;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::merge::flatten_merged_cells;
use crate::spreadsheet::reference::CellRange;
use crate::spreadsheet::xlsx::XlsxWorkbook;
use crate::spreadsheet::Worksheet;
use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt::Display;
use std::fs;
use std::path::Path;

/// How sheets are cut into header and data rows, resolved once per run.
#[derive(Clone, Debug)]
pub struct ExtractOptions {
    pub sheet_name: String,
    /// Rectangle to read, the used range when `None`
    pub region: Option<CellRange>,
    pub header_rows: usize,
    pub header_joiner: String,
    pub approach: TypeApproach,
}

impl ExtractOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            sheet_name: config.sheet_name.to_owned(),
            region: parse_region(config.region.as_deref()),
            header_rows: config.header_rows,
            header_joiner: config.header_joiner.to_owned(),
            approach: config.type_approach,
        }
    }
}

/// A synthetic column set to the same value on every row of a file.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtraColumn {
    /// Sanitized column name
    pub name: String,
    pub value: String,
}

impl ExtraColumn {
    pub fn new(raw_name: &str, value: &str) -> Self {
        Self {
            name: finalize(raw_name, &mut HashSet::new()),
            value: value.to_owned(),
        }
    }
}

/// Header, rows and samples read from one file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FileTable {
    /// Unique column names, in sheet order
    pub header: Vec<String>,
    pub rows: Vec<RowRecord>,
    /// First non-empty value per column, only collected for [`TypeApproach::Auto`]
    pub samples: HashMap<String, CellValue>,
}

/// Why a file contributes nothing to the table.
#[derive(Clone, Debug, PartialEq)]
pub enum SkipReason {
    EmptyFile,
    MissingSheet(String),
    EmptySheet(String),
    /// The sheet has no cells, so the configured region holds nothing either
    EmptyRegion { sheet: String, region: CellRange },
    InsufficientRows { found: usize, required: usize },
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::EmptyFile => write!(f, "file is empty"),
            SkipReason::MissingSheet(name) => write!(f, "no sheet '{name}'"),
            SkipReason::EmptySheet(name) => write!(f, "sheet '{name}' has no cells"),
            SkipReason::EmptyRegion { sheet, region } => {
                write!(f, "sheet '{sheet}' has no cells, region {region} is empty")
            }
            SkipReason::InsufficientRows { found, required } => {
                write!(f, "{found} rows found, {required} header rows expected")
            }
        }
    }
}

/// Result of reading one file.
#[derive(Clone, Debug, PartialEq)]
pub enum Extraction {
    Table(FileTable),
    Skipped(SkipReason),
}

/// Reads the configured sheet of a workbook file.
///
/// Unreadable or corrupt workbooks fail with the file path in the message.
pub fn extract_file(
    path: &Path,
    options: &ExtractOptions,
    extra: Option<&ExtraColumn>,
) -> Result<Extraction, SheetSqlError> {
    let prefix = path.display().to_string();
    let metadata = fs::metadata(path).map_err(SheetSqlError::from).with_prefix(&prefix)?;
    if metadata.len() == 0 {
        return Ok(Extraction::Skipped(SkipReason::EmptyFile));
    }
    let mut workbook = XlsxWorkbook::open(path).with_prefix(&prefix)?;
    let mut sheet = match workbook.read_sheet(&options.sheet_name).with_prefix(&prefix)? {
        Some(sheet) => sheet,
        None => return Ok(Extraction::Skipped(SkipReason::MissingSheet(options.sheet_name.to_owned()))),
    };
    extract_sheet(&mut sheet, options, extra).with_prefix(&prefix)
}

/// Turns a worksheet into a [`FileTable`]: flattens merges, reads the region, combines and
/// sanitizes the header, then maps every data row by column name.
pub fn extract_sheet<W: Worksheet + ?Sized>(
    worksheet: &mut W,
    options: &ExtractOptions,
    extra: Option<&ExtraColumn>,
) -> Result<Extraction, SheetSqlError> {
    flatten_merged_cells(worksheet)?;
    let Some(used_range) = worksheet.used_range() else {
        let sheet = options.sheet_name.to_owned();
        let reason = match options.region {
            Some(region) => SkipReason::EmptyRegion { sheet, region },
            None => SkipReason::EmptySheet(sheet),
        };
        return Ok(Extraction::Skipped(reason));
    };
    let (start_col, start_row, end_col, end_row) = options.region.unwrap_or(used_range).bounds();

    let mut grid = Vec::with_capacity(end_row - start_row + 1);
    for row in start_row..=end_row {
        let mut cells = Vec::with_capacity(end_col - start_col + 1);
        for col in start_col..=end_col {
            cells.push(worksheet.read(row, col)?);
        }
        grid.push(cells);
    }
    if grid.len() < options.header_rows {
        return Ok(Extraction::Skipped(SkipReason::InsufficientRows {
            found: grid.len(),
            required: options.header_rows,
        }));
    }

    let mut used_names = HashSet::new();
    let mut header: Vec<String> = combine_header(&grid, options.header_rows, &options.header_joiner)
        .iter()
        .map(|label| finalize(label, &mut used_names))
        .collect();

    let mut rows: Vec<RowRecord> = grid
        .into_iter()
        .skip(options.header_rows)
        .map(|cells| header.iter().cloned().zip(cells).collect())
        .collect();

    if let Some(extra) = extra {
        if !header.contains(&extra.name) {
            header.push(extra.name.to_owned());
        }
        for row in rows.iter_mut() {
            row.insert(extra.name.to_owned(), CellValue::Text(extra.value.to_owned()));
        }
    }

    let mut samples = HashMap::new();
    if options.approach == TypeApproach::Auto {
        for row in &rows {
            for name in &header {
                if samples.contains_key(name) {
                    continue;
                }
                if let Some(value) = row.get(name).filter(|value| !value.is_empty()) {
                    samples.insert(name.to_owned(), value.clone());
                }
            }
        }
    }

    Ok(Extraction::Table(FileTable { header, rows, samples }))
}
