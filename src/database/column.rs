use crate::spreadsheet::cell::CellValue;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

static NUMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("Hardcode regex pattern")
});

/// How column types are chosen for a run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeApproach {
    /// Every column is text
    #[default]
    StringAll,
    /// Numeric columns are detected from one sample value per column
    Auto,
}

/// Type of a column in the created table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeclaredType {
    Text,
    Integer,
    Real,
}

/// SQL flavour a sink renders declared types in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SqlDialect {
    /// Generated scripts, for PostgreSQL
    Postgres,
    /// The embedded DuckDB database
    DuckDb,
}

/// DuckDB type of numeric columns. Each value keeps its own member, so integers stay exact,
/// reals are not rounded and unparseable text is stored as text.
pub const DUCKDB_NUMERIC_TYPE: &str = "UNION(integer_value BIGINT, real_value DOUBLE, text_value VARCHAR)";

impl DeclaredType {
    /// Returns the type name used in `CREATE TABLE` for a dialect.
    pub const fn as_sql(&self, dialect: SqlDialect) -> &'static str {
        match (dialect, self) {
            (SqlDialect::Postgres, DeclaredType::Text) => "TEXT",
            (SqlDialect::Postgres, DeclaredType::Integer | DeclaredType::Real) => "NUMERIC",
            (SqlDialect::DuckDb, DeclaredType::Text) => "VARCHAR",
            (SqlDialect::DuckDb, DeclaredType::Integer | DeclaredType::Real) => DUCKDB_NUMERIC_TYPE,
        }
    }
}

/// A resolved value, ready to be written by a sink.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

/// Decides the declared type of a column from its sample value.
///
/// With [`TypeApproach::StringAll`] every column is text. With [`TypeApproach::Auto`] numeric
/// samples, and text samples that read as numbers, make the column numeric; anything else
/// (no sample, dates, other text) keeps it text.
pub fn declared_type(approach: TypeApproach, sample: Option<&CellValue>) -> DeclaredType {
    if approach == TypeApproach::StringAll {
        return DeclaredType::Text;
    }
    match sample {
        Some(CellValue::Integer(_)) => DeclaredType::Integer,
        Some(CellValue::Real(_)) => DeclaredType::Real,
        Some(CellValue::Text(text)) => match parse_number(text) {
            Some(SqlValue::Integer(_)) => DeclaredType::Integer,
            Some(SqlValue::Real(_)) => DeclaredType::Real,
            _ => DeclaredType::Text,
        },
        _ => DeclaredType::Text,
    }
}

/// Converts a raw cell value to what a sink writes.
///
/// Empty cells become `NULL` under both approaches. With [`TypeApproach::Auto`] text that reads
/// as a number is converted, other text is kept as is; the declared type of the column is not
/// consulted, so a numeric column may receive text.
pub fn convert_value(approach: TypeApproach, value: &CellValue) -> SqlValue {
    match (approach, value) {
        (_, CellValue::Empty) => SqlValue::Null,
        (TypeApproach::StringAll, value) => SqlValue::Text(value.to_string()),
        (TypeApproach::Auto, CellValue::Integer(value)) => SqlValue::Integer(*value),
        (TypeApproach::Auto, CellValue::Real(value)) => SqlValue::Real(*value),
        (TypeApproach::Auto, CellValue::Temporal(value)) => SqlValue::Text(value.to_string()),
        (TypeApproach::Auto, CellValue::Text(text)) => {
            parse_number(text).unwrap_or_else(|| SqlValue::Text(text.to_owned()))
        }
    }
}

/// Reads trimmed text as a decimal number: [`SqlValue::Integer`] when it has no fractional
/// part and fits in 64 bits, [`SqlValue::Real`] otherwise. `inf` and `nan` are not numbers here.
pub fn parse_number(text: &str) -> Option<SqlValue> {
    let text = text.trim();
    if !NUMBER_PATTERN.is_match(text) {
        return None;
    }
    let value = text.parse::<f64>().ok().filter(|value| value.is_finite())?;
    if value.fract() == 0.0 {
        if let Some(integer) = integer_value(text, value) {
            return Some(SqlValue::Integer(integer));
        }
    }
    Some(SqlValue::Real(value))
}

/// Exact integer for plain digit strings, or for whole floats inside the i64 range.
fn integer_value(text: &str, value: f64) -> Option<i64> {
    if let Ok(integer) = text.parse::<i64>() {
        return Some(integer);
    }
    // 2^63 is the first float past i64::MAX
    if value >= -9_223_372_036_854_775_808.0 && value < 9_223_372_036_854_775_808.0 {
        Some(value as i64)
    } else {
        None
    }
}
