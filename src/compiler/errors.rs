//! Compiler error types
//!
//! Error codes:
//! - EMBEDDB_UNSUPPORTED_QUERY_SHAPE
//! - EMBEDDB_UNSUPPORTED_EXPRESSION
//! - EMBEDDB_TYPE_ERROR
//! - EMBEDDB_INTERNAL_INVARIANT
//! - EMBEDDB_SQL_SYNTAX (front end)
//! - EMBEDDB_UNKNOWN_TABLE (front end)
//! - EMBEDDB_UNKNOWN_COLUMN (front end)
//!
//! A compile call either returns a complete program or exactly one of these.

use std::fmt;

/// Compile error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorCode {
    /// Multi-table, outer join, disjunction, multiple GROUP BY/HAVING, ...
    UnsupportedQueryShape,
    /// Unknown function or operator
    UnsupportedExpression,
    /// Non-integer column type or non-numeric literal
    TypeError,
    /// The compiler's own invariants were broken
    InternalInvariantViolation,
    /// SQL text could not be parsed
    SqlSyntax,
    /// Referenced table is not in the catalog
    UnknownTable,
    /// Referenced column is not in the table
    UnknownColumn,
}

impl CompileErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            CompileErrorCode::UnsupportedQueryShape => "EMBEDDB_UNSUPPORTED_QUERY_SHAPE",
            CompileErrorCode::UnsupportedExpression => "EMBEDDB_UNSUPPORTED_EXPRESSION",
            CompileErrorCode::TypeError => "EMBEDDB_TYPE_ERROR",
            CompileErrorCode::InternalInvariantViolation => "EMBEDDB_INTERNAL_INVARIANT",
            CompileErrorCode::SqlSyntax => "EMBEDDB_SQL_SYNTAX",
            CompileErrorCode::UnknownTable => "EMBEDDB_UNKNOWN_TABLE",
            CompileErrorCode::UnknownColumn => "EMBEDDB_UNKNOWN_COLUMN",
        }
    }
}

impl fmt::Display for CompileErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Compile error with code and message
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    code: CompileErrorCode,
    message: String,
}

impl CompileError {
    /// Create an error with an explicit code
    pub fn new(code: CompileErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Query shape outside the supported subset
    pub fn unsupported_shape(reason: impl Into<String>) -> Self {
        Self::new(CompileErrorCode::UnsupportedQueryShape, reason)
    }

    /// Unknown function or operator
    pub fn unsupported_expression(reason: impl Into<String>) -> Self {
        Self::new(CompileErrorCode::UnsupportedExpression, reason)
    }

    /// Type mismatch
    pub fn type_error(reason: impl Into<String>) -> Self {
        Self::new(CompileErrorCode::TypeError, reason)
    }

    /// Internal invariant violated
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::new(CompileErrorCode::InternalInvariantViolation, reason)
    }

    /// SQL text could not be parsed
    pub fn syntax(reason: impl Into<String>) -> Self {
        Self::new(CompileErrorCode::SqlSyntax, reason)
    }

    /// Table not found in the catalog
    pub fn unknown_table(table: impl Into<String>) -> Self {
        Self::new(
            CompileErrorCode::UnknownTable,
            format!("Table '{}' not found", table.into()),
        )
    }

    /// Column not found in the table
    pub fn unknown_column(column: impl Into<String>, table: impl Into<String>) -> Self {
        Self::new(
            CompileErrorCode::UnknownColumn,
            format!(
                "Column '{}' not found in table '{}'",
                column.into(),
                table.into()
            ),
        )
    }

    /// Returns the error code
    pub fn code(&self) -> CompileErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CompileError {}

/// Result type for compiler operations
pub type CompileResult<T> = Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(
            CompileErrorCode::UnsupportedQueryShape.code(),
            "EMBEDDB_UNSUPPORTED_QUERY_SHAPE"
        );
        assert_eq!(
            CompileErrorCode::UnsupportedExpression.code(),
            "EMBEDDB_UNSUPPORTED_EXPRESSION"
        );
        assert_eq!(CompileErrorCode::TypeError.code(), "EMBEDDB_TYPE_ERROR");
        assert_eq!(
            CompileErrorCode::InternalInvariantViolation.code(),
            "EMBEDDB_INTERNAL_INVARIANT"
        );
    }

    #[test]
    fn test_error_display() {
        let err = CompileError::unknown_column("temp", "uwa");
        let display = format!("{}", err);
        assert!(display.starts_with("EMBEDDB_UNKNOWN_COLUMN: "));
        assert!(display.contains("temp"));
        assert!(display.contains("uwa"));
    }
}
