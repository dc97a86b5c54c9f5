use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use rowforge::compiler::{compile, render_adapter, CompiledSchema, SchemaModel};
use rowforge::gateway::Gateway;
use rowforge::{logging, RowforgeError, Settings};

/// Compiles schema models and prints their table statement and adapter source.
#[derive(Parser, Debug)]
#[command(name = "rowforge", version, about)]
struct Args {
    /// Schema model files (JSON)
    #[arg(required = true, value_name = "SCHEMA")]
    schemas: Vec<PathBuf>,

    /// Settings file, instead of an optional rowforge.toml
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Also create the tables in the configured database
    #[arg(long)]
    apply: bool,
}

fn read_schema(path: &Path) -> rowforge::Result<CompiledSchema> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| RowforgeError::Configuration(format!("{}: {}", path.display(), e)))?;
    let schema: SchemaModel = serde_json::from_str(&text)
        .map_err(|e| RowforgeError::Configuration(format!("{}: {}", path.display(), e)))?;
    Ok(compile(&schema)?)
}

fn main() -> ExitCode {
    let args = Args::parse();
    let settings = match &args.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    logging::init(&settings.log_filter);

    let database = if args.apply {
        match settings.open_database() {
            Ok(conn) => Some(conn),
            Err(e) => {
                error!(error = %e, database = %settings.database, "cannot open database");
                return ExitCode::FAILURE;
            }
        }
    } else {
        None
    };

    let mut failures = 0;
    for path in &args.schemas {
        let compiled = match read_schema(path) {
            Ok(compiled) => compiled,
            Err(e) => {
                error!(file = %path.display(), error = %e, "schema rejected");
                failures += 1;
                continue;
            }
        };
        println!("{}", compiled.create_statement());
        println!();
        println!("{}", render_adapter(&compiled));
        if let Some(conn) = &database {
            match Gateway::execute(conn, compiled.create_statement()) {
                Ok(()) => info!(table = %compiled.schema().table_name(), "table created"),
                Err(e) => {
                    error!(file = %path.display(), error = %e, "table not created");
                    failures += 1;
                }
            }
        }
    }

    if failures > 0 {
        error!(failures, total = args.schemas.len(), "some schemas failed");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
