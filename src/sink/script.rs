use crate::database::column::SqlDialect;
use crate::database::column::SqlValue;
use crate::database::table::quote_identifier;
use crate::database::table::quote_literal;
use crate::database::table::RowRecord;
use crate::database::table::TableDefinition;
use crate::error::SheetSqlError;
use crate::sink::TableSink;
use std::io::Write;
use tracing::debug;

/// Writes the table as a PostgreSQL script: drop, create, then one `INSERT` per row.
pub struct ScriptSink<W: Write> {
    writer: W,
}

impl<W: Write> ScriptSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TableSink for ScriptSink<W> {
    fn write_table(&mut self, definition: &TableDefinition, rows: &[RowRecord]) -> Result<(), SheetSqlError> {
        let table = quote_identifier(&definition.name);
        let columns: Vec<String> = definition
            .columns
            .iter()
            .map(|column| quote_identifier(&column.name))
            .collect();
        let declarations: Vec<String> = definition
            .columns
            .iter()
            .zip(&columns)
            .map(|(column, name)| format!("  {name} {}", column.kind.as_sql(SqlDialect::Postgres)))
            .collect();

        writeln!(self.writer, "DROP TABLE IF EXISTS {table};")?;
        writeln!(self.writer, "CREATE TABLE {table} (\n{}\n);", declarations.join(",\n"))?;
        let column_list = columns.join(", ");
        for row in rows {
            let values: Vec<String> = definition.materialize(row).iter().map(render_literal).collect();
            writeln!(
                self.writer,
                "INSERT INTO {table} ({column_list}) VALUES ({});",
                values.join(", ")
            )?;
        }
        self.writer.flush()?;
        debug!("Wrote script for {} rows of {table}", rows.len());
        Ok(())
    }
}

/// Renders a value as a SQL literal.
fn render_literal(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_owned(),
        SqlValue::Integer(value) => value.to_string(),
        SqlValue::Real(value) => value.to_string(),
        SqlValue::Text(text) => quote_literal(text),
    }
}
