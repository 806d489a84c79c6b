//! # Catalog Errors

use thiserror::Error;

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Catalog errors raised while applying DDL
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("SQL syntax error: {0}")]
    Syntax(String),

    #[error("Table already exists: {0}")]
    TableExists(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    #[error("Index already exists: {0}")]
    IndexExists(String),

    #[error("Unsupported DDL: {0}")]
    Unsupported(String),
}

impl CatalogError {
    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::Syntax(_) => "EMBEDDB_CATALOG_SYNTAX",
            CatalogError::TableExists(_) => "EMBEDDB_CATALOG_TABLE_EXISTS",
            CatalogError::TableNotFound(_) => "EMBEDDB_CATALOG_TABLE_NOT_FOUND",
            CatalogError::ColumnNotFound { .. } => "EMBEDDB_CATALOG_COLUMN_NOT_FOUND",
            CatalogError::IndexExists(_) => "EMBEDDB_CATALOG_INDEX_EXISTS",
            CatalogError::Unsupported(_) => "EMBEDDB_CATALOG_UNSUPPORTED",
        }
    }
}
