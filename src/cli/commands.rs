//! CLI command implementations
//!
//! Every command follows the same start-up sequence:
//! 1. Load the config file (if given) and apply CLI overrides
//! 2. Set the log level
//! 3. Build the catalog from config DDL, config DDL files, then `--ddl` files
//!
//! Program text goes to stdout, logs and errors to stderr.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::catalog::Catalog;
use crate::compiler::{ExplainPlan, QueryCompiler};
use crate::observability::Logger;

use super::args::{CatalogArgs, Command};
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::{compile_statement, run_shell, OutputOptions};

/// Main entry point for the CLI
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Compile { catalog, query } => compile(&catalog, &query),
        Command::Explain {
            catalog,
            query,
            json,
        } => explain(&catalog, &query, json),
        Command::Shell { catalog } => shell(&catalog),
    }
}

/// Config and catalog for one command
pub fn prepare(args: &CatalogArgs) -> CliResult<(Config, Catalog)> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    Logger::set_min_severity(config.severity()?);

    let mut catalog = Catalog::new();
    for statement in &config.ddl {
        catalog.execute_ddl(statement)?;
    }
    for path in config.ddl_files.iter().chain(&args.ddl) {
        apply_ddl_file(&mut catalog, path)?;
    }
    Ok((config, catalog))
}

/// Apply every statement of a DDL script
pub fn apply_ddl_file(catalog: &mut Catalog, path: &Path) -> CliResult<()> {
    let script = fs::read_to_string(path).map_err(|e| {
        CliError::io_error(format!("Failed to read DDL file {}: {}", path.display(), e))
    })?;
    catalog.execute_ddl(&script)?;
    Ok(())
}

/// Compile one query and print the program
pub fn compile(args: &CatalogArgs, query: &str) -> CliResult<()> {
    let (config, catalog) = prepare(args)?;
    let text = compile_statement(
        &catalog,
        query,
        OutputOptions {
            emit_explain: config.emit_explain,
        },
    )?;

    let mut stdout = io::stdout();
    write!(stdout, "{}", text)?;
    stdout.flush()?;
    Ok(())
}

/// Print the plan of one query; a rejected query still prints its plan
pub fn explain(args: &CatalogArgs, query: &str, json: bool) -> CliResult<()> {
    let (_, catalog) = prepare(args)?;
    let explain = match QueryCompiler::new(&catalog).plan_sql(query) {
        Ok(program) => ExplainPlan::from_program(&program),
        Err(e) => ExplainPlan::from_error(&e),
    };

    let mut stdout = io::stdout();
    if json {
        serde_json::to_writer_pretty(&mut stdout, &explain.to_json())?;
        writeln!(stdout)?;
    } else {
        write!(stdout, "{}", explain)?;
    }
    stdout.flush()?;
    Ok(())
}

/// Interactive shell over stdin
pub fn shell(args: &CatalogArgs) -> CliResult<()> {
    let (config, mut catalog) = prepare(args)?;
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    run_shell(
        &mut catalog,
        stdin.lock(),
        &mut stdout,
        &mut stderr,
        OutputOptions {
            emit_explain: config.emit_explain,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_prepare_applies_ddl_in_order() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("index.sql"),
            "CREATE INDEX uTemp ON uwa (airTemp);",
        )
        .unwrap();
        let config_path = dir.path().join("embeddb.json");
        fs::write(
            &config_path,
            r#"{
                "ddl": ["CREATE TABLE uwa (id INT PRIMARY KEY, airTemp INT)"],
                "ddl_files": ["index.sql"]
            }"#,
        )
        .unwrap();

        let args = CatalogArgs {
            config: Some(config_path),
            ..Default::default()
        };
        let (_, catalog) = prepare(&args).unwrap();
        let table = catalog.table("uwa").unwrap();
        assert_eq!(table.indexes.len(), 1);
    }

    #[test]
    fn test_missing_ddl_file() {
        let args = CatalogArgs {
            ddl: vec!["/nonexistent/schema.sql".into()],
            ..Default::default()
        };
        let err = prepare(&args).unwrap_err();
        assert_eq!(err.code_str(), "EMBEDDB_CLI_IO_ERROR");
    }

    #[test]
    fn test_log_level_override_validated() {
        let args = CatalogArgs {
            log_level: Some("verbose".into()),
            ..Default::default()
        };
        let err = prepare(&args).unwrap_err();
        assert_eq!(err.code_str(), "EMBEDDB_CLI_CONFIG_ERROR");
    }
}
