//! CLI-specific error types
//!
//! Every CLI error ends the command; the shell reports compile and DDL
//! errors and keeps reading.

use std::fmt;
use std::io;

use crate::catalog::CatalogError;
use crate::compiler::CompileError;

/// What a CLI command failed on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout, DDL files)
    IoError,
    /// DDL could not be applied
    CatalogError,
    /// Query could not be compiled
    CompileError,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "EMBEDDB_CLI_CONFIG_ERROR",
            Self::IoError => "EMBEDDB_CLI_IO_ERROR",
            Self::CatalogError => "EMBEDDB_CLI_CATALOG_ERROR",
            Self::CompileError => "EMBEDDB_CLI_COMPILE_ERROR",
        }
    }
}

/// Error that ends a CLI command
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Wrapped compile and catalog errors already carry their own code and are
/// printed unchanged.
impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            CliErrorCode::CompileError | CliErrorCode::CatalogError => f.write_str(&self.message),
            _ => write!(f, "{}: {}", self.code.code(), self.message),
        }
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("cannot write JSON: {}", e))
    }
}

impl From<CatalogError> for CliError {
    fn from(e: CatalogError) -> Self {
        Self::new(CliErrorCode::CatalogError, format!("{}: {}", e.code(), e))
    }
}

impl From<CompileError> for CliError {
    fn from(e: CompileError) -> Self {
        Self::new(CliErrorCode::CompileError, e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
