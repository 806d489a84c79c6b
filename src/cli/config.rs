//! Configuration file
//!
//! JSON, every field optional:
//!
//! ```json
//! {
//!   "ddl": ["CREATE TABLE uwa (id INT PRIMARY KEY, airTemp INT)"],
//!   "ddl_files": ["schema.sql"],
//!   "log_level": "warn",
//!   "emit_explain": false
//! }
//! ```
//!
//! Relative `ddl_files` are resolved against the directory of the config
//! file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::observability::{log_event_with_fields, Event, Severity};

use super::errors::{CliError, CliResult};

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// DDL statements applied at start-up, in order
    #[serde(default)]
    pub ddl: Vec<String>,

    /// DDL scripts applied after `ddl`, in order
    #[serde(default)]
    pub ddl_files: Vec<PathBuf>,

    /// Minimum log severity (default "warn")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Prefix compiled programs with the explain plan as a C comment
    #[serde(default)]
    pub emit_explain: bool,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ddl: Vec::new(),
            ddl_files: Vec::new(),
            log_level: default_log_level(),
            emit_explain: false,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let mut config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.ddl_files = config
            .ddl_files
            .into_iter()
            .map(|file| if file.is_relative() { base.join(file) } else { file })
            .collect();

        config.validate()?;

        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("path", &path.display().to_string()),
                ("ddl_files", &config.ddl_files.len().to_string()),
            ],
        );

        Ok(config)
    }

    /// Validate field values
    pub fn validate(&self) -> CliResult<()> {
        self.severity().map(|_| ())
    }

    /// Parsed `log_level`
    pub fn severity(&self) -> CliResult<Severity> {
        self.log_level.parse::<Severity>().map_err(|e| {
            CliError::config_error(format!("Invalid log_level '{}': {}", self.log_level, e))
        })
    }
}
