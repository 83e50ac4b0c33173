use crate::spreadsheet::reference::col_to_index;
use crate::spreadsheet::reference::row_to_index;
use crate::spreadsheet::reference::CellRange;
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

static REGION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]+)(\d+):([A-Za-z]+)(\d+)$").expect("Hardcode regex pattern"));

/// Parses a configured region such as `B2:F100` (1-based, inclusive, letters in any case).
///
/// An absent or blank region means the whole used range. A malformed one is reported with a warning
/// and degrades to the whole used range as well. Reversed corners are normalized.
pub fn parse_region(region: Option<&str>) -> Option<CellRange> {
    let region = region?.trim();
    if region.is_empty() {
        return None;
    }
    let parsed = REGION_PATTERN.captures(region).and_then(|captures| {
        let start_col = col_to_index(&captures[1])?;
        let start_row = row_to_index(&captures[2])?;
        let end_col = col_to_index(&captures[3])?;
        let end_row = row_to_index(&captures[4])?;
        Some(CellRange::new(start_col, start_row, end_col, end_row))
    });
    if parsed.is_none() {
        warn!("Ignore invalid region '{region}', the whole sheet is used");
    }
    parsed
}
