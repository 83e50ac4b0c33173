use crate::database::column::SqlDialect;
use crate::database::column::SqlValue;
use crate::database::table::quote_identifier;
use crate::database::table::RowRecord;
use crate::database::table::TableDefinition;
use crate::error::SheetSqlError;
use crate::sink::TableSink;
use duckdb::params_from_iter;
use duckdb::types::Value;
use duckdb::Connection;
use std::path::Path;
use tracing::info;

/// Loads the table into a DuckDB database inside one transaction.
///
/// Nothing is committed unless every statement succeeds. Numeric columns are declared as
/// [`DUCKDB_NUMERIC_TYPE`](crate::database::column::DUCKDB_NUMERIC_TYPE), so a text value
/// in a numeric column is stored as text.
pub struct DuckDbSink {
    connection: Connection,
}

impl DuckDbSink {
    /// Opens (or creates) a database file.
    pub fn open(path: &Path) -> Result<Self, SheetSqlError> {
        Ok(Self::new(Connection::open(path)?))
    }

    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }
}

impl TableSink for DuckDbSink {
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
            .map(|(column, name)| format!("{name} {}", column.kind.as_sql(SqlDialect::DuckDb)))
            .collect();
        let placeholders = vec!["?"; columns.len()].join(", ");

        let transaction = self.connection.transaction()?;
        transaction.execute_batch(&format!(
            "DROP TABLE IF EXISTS {table}; CREATE TABLE {table} ({});",
            declarations.join(", ")
        ))?;
        {
            let mut statement = transaction.prepare(&format!(
                "INSERT INTO {table} ({}) VALUES ({placeholders})",
                columns.join(", ")
            ))?;
            for row in rows {
                statement.execute(params_from_iter(definition.materialize(row).into_iter().map(to_value)))?;
            }
        }
        transaction.commit()?;
        info!("Loaded {} rows into {table}", rows.len());
        Ok(())
    }
}

fn to_value(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(value) => Value::BigInt(value),
        SqlValue::Real(value) => Value::Double(value),
        SqlValue::Text(text) => Value::Text(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::column::TypeApproach;
    use crate::spreadsheet::cell::CellValue;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn count(connection: &Connection, table: &str) -> i64 {
        connection
            .query_row(&format!("SELECT count(*) FROM \"{table}\""), [], |row| row.get(0))
            .unwrap()
    }

    /// Column values as text, with the union member they were stored in, in insertion order.
    fn stored(connection: &Connection, table: &str, column: &str) -> Vec<(Option<String>, Option<String>)> {
        let mut statement = connection
            .prepare(&format!(
                "SELECT \"{column}\"::VARCHAR, union_tag(\"{column}\")::VARCHAR FROM \"{table}\" ORDER BY rowid"
            ))
            .unwrap();
        let values = statement
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .map(|row| row.unwrap())
            .collect();
        values
    }

    #[test]
    fn loads_typed_rows() {
        let samples = HashMap::from([
            ("id".to_owned(), CellValue::Integer(1)),
            ("price".to_owned(), CellValue::Real(2.5)),
        ]);
        let definition =
            TableDefinition::new("items", &columns(&["id", "price", "name"]), &samples, TypeApproach::Auto);
        let rows = vec![
            RowRecord::from([
                ("id".to_owned(), CellValue::Integer(1)),
                ("price".to_owned(), CellValue::Real(2.5)),
                ("name".to_owned(), CellValue::Text("pen".into())),
            ]),
            RowRecord::from([("id".to_owned(), CellValue::Integer(2))]),
        ];
        let mut sink = DuckDbSink::new(Connection::open_in_memory().unwrap());
        sink.write_table(&definition, &rows).unwrap();

        let connection = sink.connection();
        assert_eq!(count(connection, "items"), 2);
        assert_eq!(
            stored(connection, "items", "id"),
            vec![
                (Some("1".to_owned()), Some("integer_value".to_owned())),
                (Some("2".to_owned()), Some("integer_value".to_owned())),
            ]
        );
        assert_eq!(
            stored(connection, "items", "price"),
            vec![(Some("2.5".to_owned()), Some("real_value".to_owned())), (None, None)]
        );
        let names: Vec<Option<String>> = connection
            .prepare("SELECT name FROM items ORDER BY rowid")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .map(|row| row.unwrap())
            .collect();
        assert_eq!(names, vec![Some("pen".to_owned()), None]);
    }

    #[test]
    fn replaces_an_existing_table() {
        let definition = TableDefinition::new("t", &columns(&["a"]), &HashMap::new(), TypeApproach::StringAll);
        let rows = vec![RowRecord::from([("a".to_owned(), CellValue::Text("x".into()))])];
        let mut sink = DuckDbSink::new(Connection::open_in_memory().unwrap());
        sink.write_table(&definition, &rows).unwrap();
        sink.write_table(&definition, &rows).unwrap();
        assert_eq!(count(sink.connection(), "t"), 1);
    }

    #[test]
    fn text_in_a_numeric_column_is_stored_as_text() {
        let samples = HashMap::from([("n".to_owned(), CellValue::Integer(42))]);
        let definition = TableDefinition::new("numbers", &columns(&["n"]), &samples, TypeApproach::Auto);
        let rows = vec![
            RowRecord::from([("n".to_owned(), CellValue::Integer(42))]),
            RowRecord::from([("n".to_owned(), CellValue::Text("abc".into()))]),
        ];
        let mut sink = DuckDbSink::new(Connection::open_in_memory().unwrap());
        sink.write_table(&definition, &rows).unwrap();

        assert_eq!(
            stored(sink.connection(), "numbers", "n"),
            vec![
                (Some("42".to_owned()), Some("integer_value".to_owned())),
                (Some("abc".to_owned()), Some("text_value".to_owned())),
            ]
        );
    }

    #[test]
    fn reals_in_an_integer_sampled_column_are_not_rounded() {
        let samples = HashMap::from([("n".to_owned(), CellValue::Integer(1))]);
        let definition = TableDefinition::new("numbers", &columns(&["n"]), &samples, TypeApproach::Auto);
        let rows = vec![
            RowRecord::from([("n".to_owned(), CellValue::Integer(1))]),
            RowRecord::from([("n".to_owned(), CellValue::Real(2.5))]),
            RowRecord::from([("n".to_owned(), CellValue::Text("3.7".into()))]),
        ];
        let mut sink = DuckDbSink::new(Connection::open_in_memory().unwrap());
        sink.write_table(&definition, &rows).unwrap();

        let values: Vec<Option<String>> = stored(sink.connection(), "numbers", "n")
            .into_iter()
            .map(|(value, _)| value)
            .collect();
        assert_eq!(values, vec![Some("1".to_owned()), Some("2.5".to_owned()), Some("3.7".to_owned())]);
    }

    #[test]
    fn failed_loads_leave_the_database_unchanged() {
        let definition = TableDefinition::new("t", &columns(&["a"]), &HashMap::new(), TypeApproach::StringAll);
        let rows = vec![RowRecord::from([("a".to_owned(), CellValue::Text("x".into()))])];
        let mut sink = DuckDbSink::new(Connection::open_in_memory().unwrap());
        sink.connection().execute_batch("CREATE VIEW t AS SELECT 'old' AS a;").unwrap();

        assert!(sink.write_table(&definition, &rows).is_err());
        let kept: String = sink.connection().query_row("SELECT a FROM t", [], |row| row.get(0)).unwrap();
        assert_eq!(kept, "old");
    }

    #[test]
    fn writes_database_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output.duckdb");
        let definition = TableDefinition::new("t", &columns(&["a"]), &HashMap::new(), TypeApproach::StringAll);
        let rows = vec![RowRecord::from([("a".to_owned(), CellValue::Integer(1))])];
        DuckDbSink::open(&path).unwrap().write_table(&definition, &rows).unwrap();

        let connection = Connection::open(&path).unwrap();
        let value: String = connection.query_row("SELECT a FROM t", [], |row| row.get(0)).unwrap();
        assert_eq!(value, "1");
    }
}
