//! Conversion settings, read from a JSON file with camelCase keys.
//!
//! ```json
//! {
//!   "tableName": "sales",
//!   "directory": "./monthly",
//!   "filenamePattern": "sales_(\\d{6})",
//!   "filenameColumnName": "Month",
//!   "sheetName": "Data",
//!   "region": "A3:H500",
//!   "headerRows": 2,
//!   "headerJoiner": " - ",
//!   "typeApproach": "auto"
//! }
//! ```

use crate::convert::header::DEFAULT_HEADER_JOINER;
use crate::database::column::TypeApproach;
use crate::error::ResultMessage;
use crate::error::SheetSqlError;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

/// Errors in the conversion settings, raised before any workbook is read.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("'tableName' is missing or empty")]
    MissingTableName,

    #[error("Source directory '{0}' does not exist or is not a directory")]
    InvalidDirectory(String),

    #[error("'filenamePattern' '{pattern}' has {groups} capturing groups, at most 1 is allowed")]
    TooManyCaptureGroups { pattern: String, groups: usize },

    #[error("No input workbook: set 'directory' in the configuration or pass an input file")]
    MissingInput,
}

/// Settings of one conversion run.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Name of the created table
    #[serde(default)]
    pub table_name: String,
    /// Directory of workbooks to merge into one table
    pub directory: Option<PathBuf>,
    /// Regex a file name must match from its start; its only group, if any, is the injected value
    pub filename_pattern: Option<String>,
    /// Column receiving the file name, or the captured part of it
    pub filename_column_name: Option<String>,
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
    /// Rectangle to read, such as `B2:F100`; the used range when absent
    pub region: Option<String>,
    #[serde(default = "default_header_rows")]
    pub header_rows: usize,
    #[serde(default = "default_header_joiner")]
    pub header_joiner: String,
    #[serde(default)]
    pub type_approach: TypeApproach,
}

fn default_sheet_name() -> String {
    "Sheet1".to_owned()
}

fn default_header_rows() -> usize {
    1
}

fn default_header_joiner() -> String {
    DEFAULT_HEADER_JOINER.to_owned()
}

impl Config {
    /// Reads and validates a configuration file.
    pub fn load(path: &Path) -> Result<Config, SheetSqlError> {
        let prefix = format!("configuration '{}'", path.display());
        let text = fs::read_to_string(path).map_err(SheetSqlError::from).with_prefix(&prefix)?;
        Config::parse(&text).with_prefix(&prefix)
    }

    /// Parses and validates configuration JSON.
    pub fn parse(text: &str) -> Result<Config, SheetSqlError> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the settings that do not depend on the command line.
    pub fn validate(&self) -> Result<(), SheetSqlError> {
        if self.table_name.trim().is_empty() {
            Err(ConfigError::MissingTableName)?
        }
        if let Some(directory) = &self.directory {
            if !directory.is_dir() {
                Err(ConfigError::InvalidDirectory(directory.display().to_string()))?
            }
        }
        self.filename_regex()?;
        Ok(())
    }

    /// Compiles `filenamePattern`, anchored at the start of the file name.
    pub fn filename_regex(&self) -> Result<Option<Regex>, SheetSqlError> {
        let pattern = match &self.filename_pattern {
            Some(pattern) => pattern,
            None => return Ok(None),
        };
        let regex = Regex::new(&format!("^(?:{pattern})"))?;
        let groups = regex.captures_len() - 1;
        if groups > 1 {
            Err(ConfigError::TooManyCaptureGroups {
                pattern: pattern.to_owned(),
                groups,
            })?
        }
        Ok(Some(regex))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn applies_defaults() {
        let config = Config::parse(r#"{"tableName": "people"}"#).unwrap();
        assert_eq!(config.table_name, "people");
        assert_eq!(config.sheet_name, "Sheet1");
        assert_eq!(config.header_rows, 1);
        assert_eq!(config.header_joiner, " - ");
        assert_eq!(config.type_approach, TypeApproach::StringAll);
        assert_eq!(config.directory, None);
        assert_eq!(config.region, None);
    }

    #[test]
    fn reads_every_key() {
        let dir = TempDir::new().unwrap();
        let json = format!(
            r#"{{"tableName": "sales", "directory": {:?}, "filenamePattern": "sales_(\\d+)",
                "filenameColumnName": "Month", "sheetName": "Data", "region": "A1:C9",
                "headerRows": 2, "headerJoiner": "/", "typeApproach": "auto"}}"#,
            dir.path().display().to_string()
        );
        let config = Config::parse(&json).unwrap();
        assert_eq!(config.directory.as_deref(), Some(dir.path()));
        assert_eq!(config.filename_column_name.as_deref(), Some("Month"));
        assert_eq!(config.sheet_name, "Data");
        assert_eq!(config.region.as_deref(), Some("A1:C9"));
        assert_eq!(config.header_rows, 2);
        assert_eq!(config.header_joiner, "/");
        assert_eq!(config.type_approach, TypeApproach::Auto);
        assert!(config.filename_regex().unwrap().unwrap().is_match("sales_202401.xlsx"));
    }

    #[test]
    fn rejects_missing_table_name() {
        assert!(Config::parse("{}").is_err());
        assert!(Config::parse(r#"{"tableName": "  "}"#).is_err());
    }

    #[test]
    fn rejects_invalid_json_and_unknown_approach() {
        assert!(Config::parse("{tableName:").is_err());
        assert!(Config::parse(r#"{"tableName": "t", "typeApproach": "guess"}"#).is_err());
    }

    #[test]
    fn rejects_missing_directory() {
        let error = Config::parse(r#"{"tableName": "t", "directory": "/no/such/dir/for/sheetsql"}"#).unwrap_err();
        assert!(error.to_string().contains("does not exist"));
    }

    #[test]
    fn filename_pattern_is_anchored_and_limited() {
        let config = Config::parse(r#"{"tableName": "t", "filenamePattern": "b|report"}"#).unwrap();
        let regex = config.filename_regex().unwrap().unwrap();
        assert!(regex.is_match("report_1.xlsx"));
        assert!(!regex.is_match("annual_report.xlsx"));

        assert!(Config::parse(r#"{"tableName": "t", "filenamePattern": "(a)(b)"}"#).is_err());
        assert!(Config::parse(r#"{"tableName": "t", "filenamePattern": "(unclosed"}"#).is_err());
        assert!(Config::parse(r#"{"tableName": "t", "filenamePattern": "(?:a)(b)"}"#).is_ok());
    }

    #[test]
    fn loads_files_with_context() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"tableName": "t"}"#).unwrap();
        assert_eq!(Config::load(&path).unwrap().table_name, "t");

        let missing = dir.path().join("missing.json");
        let error = Config::load(&missing).unwrap_err();
        assert!(error.to_string().starts_with("configuration '"));
    }
}
