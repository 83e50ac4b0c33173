//! sheetsql command line

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use sheetsql::config::Config;
use sheetsql::convert::run;
use sheetsql::convert::Conversion;
use sheetsql::logging::init_logging;
use sheetsql::runner::apply_scripts;
use sheetsql::sink::DuckDbSink;
use sheetsql::sink::ScriptSink;
use sheetsql::sink::TableSink;
use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process;
use tracing::error;
use tracing::info;
use tracing::warn;

/// Convert spreadsheet workbooks into SQL tables
#[derive(Parser, Debug)]
#[command(name = "sheetsql")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a PostgreSQL script creating and filling the table
    Script {
        /// JSON configuration file
        config: PathBuf,

        /// Workbook to convert when the configuration has no directory
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Script file to write (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load the table into a DuckDB database
    Load {
        /// JSON configuration file
        config: PathBuf,

        /// Workbook to convert when the configuration has no directory
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Database file
        #[arg(short, long, env = "SHEETSQL_DATABASE", default_value = "output.duckdb")]
        database: PathBuf,
    },

    /// Apply every *.sql file of a directory to a DuckDB database, in name order
    Apply {
        /// Database file
        database: PathBuf,

        /// Directory holding the scripts
        sql_dir: PathBuf,

        /// Extension to load before the scripts
        #[arg(short, long)]
        extension: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = execute_command(&cli) {
        error!("Command failed: {e:#}");
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Script { config, input, output } => {
            let conversion = convert(config, input.as_deref())?;
            if let Conversion::Table { definition, rows } = conversion {
                let writer: Box<dyn Write> = match output {
                    Some(path) => Box::new(BufWriter::new(
                        File::create(path).with_context(|| format!("Failed to create '{}'", path.display()))?,
                    )),
                    None => Box::new(BufWriter::new(std::io::stdout().lock())),
                };
                ScriptSink::new(writer)
                    .write_table(&definition, &rows)
                    .context("Failed to write script")?;
                if let Some(path) = output {
                    info!("Wrote {} rows to '{}'", rows.len(), path.display());
                }
            }
        }
        Commands::Load { config, input, database } => {
            let conversion = convert(config, input.as_deref())?;
            if let Conversion::Table { definition, rows } = conversion {
                DuckDbSink::open(database)
                    .and_then(|mut sink| sink.write_table(&definition, &rows))
                    .with_context(|| format!("Failed to load '{}'", database.display()))?;
            }
        }
        Commands::Apply { database, sql_dir, extension } => {
            let applied = apply_scripts(database, sql_dir, extension.as_deref())
                .with_context(|| format!("Failed to apply scripts to '{}'", database.display()))?;
            if applied.is_empty() {
                warn!("No *.sql file in '{}'", sql_dir.display());
            }
        }
    }
    Ok(())
}

/// Loads the configuration and runs the conversion, warning about an empty result.
fn convert(config: &Path, input: Option<&Path>) -> Result<Conversion> {
    let config = Config::load(config)?;
    let conversion = run(&config, input).context("Conversion failed")?;
    if conversion == Conversion::Empty {
        warn!("No rows to write: no workbook was selected or every workbook was skipped");
    }
    Ok(conversion)
}
