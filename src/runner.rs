//! Post-processing: applies a directory of SQL scripts to a DuckDB database.

use crate::error::ResultMessage;
use crate::error::SheetSqlError;
use duckdb::Config;
use duckdb::Connection;
use glob::glob;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use tracing::info;

/// Runs every `*.sql` file of `directory`, in file name order, inside one transaction.
///
/// When `extension` is given the database is opened with unsigned extensions allowed and
/// the extension is loaded before the first script.
///
/// # Returns
/// The scripts that were applied
pub fn apply_scripts(
    database: &Path,
    directory: &Path,
    extension: Option<&Path>,
) -> Result<Vec<PathBuf>, SheetSqlError> {
    let scripts = list_scripts(directory)?;
    let mut connection = match extension {
        Some(_) => Connection::open_with_flags(database, Config::default().allow_unsigned_extensions()?)?,
        None => Connection::open(database)?,
    };
    if let Some(extension) = extension {
        let statement = format!("LOAD '{}';", extension.display().to_string().replace('\'', "''"));
        connection
            .execute_batch(&statement)
            .map_err(SheetSqlError::from)
            .with_prefix(&format!("load extension '{}'", extension.display()))?;
    }

    let transaction = connection.transaction()?;
    for script in &scripts {
        let prefix = script.display().to_string();
        info!("Apply {prefix}");
        let sql = fs::read_to_string(script).map_err(SheetSqlError::from).with_prefix(&prefix)?;
        transaction
            .execute_batch(&sql)
            .map_err(SheetSqlError::from)
            .with_prefix(&prefix)?;
    }
    transaction.commit()?;
    info!("Applied {} scripts to '{}'", scripts.len(), database.display());
    Ok(scripts)
}

/// `*.sql` files directly inside a directory, sorted by path.
fn list_scripts(directory: &Path) -> Result<Vec<PathBuf>, SheetSqlError> {
    let pattern = directory.join("*.sql");
    let mut scripts = Vec::new();
    for entry in glob(&pattern.to_string_lossy())? {
        let path = entry?;
        if path.is_file() {
            scripts.push(path);
        }
    }
    scripts.sort();
    Ok(scripts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn applies_scripts_in_name_order() {
        let dir = TempDir::new().unwrap();
        let scripts = dir.path().join("sql");
        fs::create_dir(&scripts).unwrap();
        fs::write(scripts.join("02_fill.sql"), "INSERT INTO t VALUES (1); INSERT INTO t VALUES (2);").unwrap();
        fs::write(scripts.join("01_create.sql"), "CREATE TABLE t (n BIGINT);").unwrap();
        fs::write(scripts.join("03_double.sql"), "UPDATE t SET n = n * 10;").unwrap();
        fs::write(scripts.join("notes.txt"), "not sql").unwrap();
        let database = dir.path().join("db.duckdb");

        let applied = apply_scripts(&database, &scripts, None).unwrap();
        let names: Vec<String> = applied
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["01_create.sql", "02_fill.sql", "03_double.sql"]);

        let connection = Connection::open(&database).unwrap();
        let total: i64 = connection.query_row("SELECT sum(n) FROM t", [], |row| row.get(0)).unwrap();
        assert_eq!(total, 30);
    }

    #[test]
    fn failing_scripts_commit_nothing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.sql"), "CREATE TABLE kept (n INTEGER);").unwrap();
        fs::write(dir.path().join("b.sql"), "SELECT * FROM missing_table;").unwrap();
        let database = dir.path().join("db.duckdb");

        let error = apply_scripts(&database, dir.path(), None).unwrap_err();
        assert!(error.to_string().contains("b.sql"));

        let connection = Connection::open(&database).unwrap();
        let tables: i64 = connection
            .query_row(
                "SELECT count(*) FROM information_schema.tables WHERE table_name = 'kept'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 0);
    }

    #[test]
    fn missing_extension_fails() {
        let dir = TempDir::new().unwrap();
        let database = dir.path().join("db.duckdb");
        let extension = dir.path().join("missing.duckdb_extension");
        assert!(apply_scripts(&database, dir.path(), Some(&extension)).is_err());
    }
}
