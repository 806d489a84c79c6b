//! CLI module for embeddb-sql
//!
//! Provides command-line interface for:
//! - compile: Print the generated C program for one query
//! - explain: Print the resolved plan for one query
//! - shell: Interactive DDL and query loop

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{CatalogArgs, Cli, Command};
pub use commands::{apply_ddl_file, compile, explain, prepare, run, run_command, shell};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{compile_statement, execute_statement, is_query, run_shell, OutputOptions};
