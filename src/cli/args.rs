//! CLI argument definitions using clap
//!
//! Commands:
//! - embeddb-sql compile [--config <path>] [--ddl <file>]... <query>
//! - embeddb-sql explain [--config <path>] [--ddl <file>]... <query>
//! - embeddb-sql shell [--config <path>] [--ddl <file>]...

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// embeddb-sql - compiles SQL SELECT statements into EmbedDB operator code
#[derive(Parser, Debug)]
#[command(name = "embeddb-sql")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct CatalogArgs {
    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// DDL script applied before the command runs (repeatable)
    #[arg(long = "ddl", value_name = "FILE")]
    pub ddl: Vec<PathBuf>,

    /// Minimum log severity (trace, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a SELECT statement and print the generated C code
    Compile {
        #[command(flatten)]
        catalog: CatalogArgs,

        /// The SELECT statement
        query: String,
    },

    /// Print the resolved plan of a SELECT statement
    Explain {
        #[command(flatten)]
        catalog: CatalogArgs,

        /// The SELECT statement
        query: String,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive shell: DDL is applied, SELECT statements are compiled
    Shell {
        #[command(flatten)]
        catalog: CatalogArgs,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compile() {
        let cli = Cli::try_parse_from([
            "embeddb-sql",
            "compile",
            "--ddl",
            "a.sql",
            "--ddl",
            "b.sql",
            "SELECT * FROM uwa",
        ])
        .unwrap();
        match cli.command {
            Command::Compile { catalog, query } => {
                assert_eq!(catalog.ddl.len(), 2);
                assert!(catalog.config.is_none());
                assert_eq!(query, "SELECT * FROM uwa");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_shell_with_config() {
        let cli = Cli::try_parse_from(["embeddb-sql", "shell", "--config", "embeddb.json"]).unwrap();
        match cli.command {
            Command::Shell { catalog } => {
                assert_eq!(catalog.config, Some(PathBuf::from("embeddb.json")));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
