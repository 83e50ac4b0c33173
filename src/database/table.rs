use crate::database::column::convert_value;
use crate::database::column::declared_type;
use crate::database::column::DeclaredType;
use crate::database::column::SqlValue;
use crate::database::column::TypeApproach;
use crate::spreadsheet::cell::CellValue;
use std::collections::HashMap;

/// One data row: column name to raw cell value.
pub type RowRecord = HashMap<String, CellValue>;

/// A column of the created table.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: DeclaredType,
}

/// The table every sink creates: its name and ordered, typed columns.
#[derive(Clone, Debug, PartialEq)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<Column>,
    /// Approach used to type the columns, applied again to every value
    pub approach: TypeApproach,
}

impl TableDefinition {
    /// Types every column of the schema from its sample.
    pub fn new(
        name: &str,
        columns: &[String],
        samples: &HashMap<String, CellValue>,
        approach: TypeApproach,
    ) -> Self {
        Self {
            name: name.to_owned(),
            columns: columns
                .iter()
                .map(|column| Column {
                    name: column.to_owned(),
                    kind: declared_type(approach, samples.get(column)),
                })
                .collect(),
            approach,
        }
    }

    /// Values of a row in column order; columns the row lacks are `NULL`, extra keys are ignored.
    pub fn materialize(&self, row: &RowRecord) -> Vec<SqlValue> {
        self.columns
            .iter()
            .map(|column| {
                row.get(&column.name)
                    .map(|value| convert_value(self.approach, value))
                    .unwrap_or(SqlValue::Null)
            })
            .collect()
    }
}

/// Double-quotes an identifier, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Single-quotes a string literal, doubling embedded quotes.
pub fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}
