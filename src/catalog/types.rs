//! Catalog type definitions
//!
//! Only 32- and 64-bit integer columns can be compiled. Other declared types
//! are kept in the catalog so that a compile against them fails with a type
//! error instead of a confusing "unknown column".

use serde::{Deserialize, Serialize};

/// Column type as declared in DDL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "lowercase")]
pub enum DeclaredType {
    /// INT / INTEGER
    Int32,
    /// BIGINT
    Int64,
    /// Anything else (VARCHAR, REAL, ...)
    Other(String),
}

impl DeclaredType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &str {
        match self {
            DeclaredType::Int32 => "INT",
            DeclaredType::Int64 => "BIGINT",
            DeclaredType::Other(name) => name,
        }
    }
}

/// Column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub declared_type: DeclaredType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, declared_type: DeclaredType) -> Self {
        Self {
            name: name.into(),
            declared_type,
        }
    }

    /// Create an INT column
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, DeclaredType::Int32)
    }

    /// Create a BIGINT column
    pub fn bigint(name: impl Into<String>) -> Self {
        Self::new(name, DeclaredType::Int64)
    }
}

/// Single-column secondary index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDef {
    pub name: String,
    /// Column number within the table
    pub column: usize,
}

/// Best index available for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexHint {
    /// No index covers the column
    None,
    /// The column is the primary key
    PrimaryKey,
    /// The column has a secondary index (ordinal in creation order)
    Secondary(u32),
}

impl IndexHint {
    /// Returns true if the column can bound an index scan
    pub fn is_indexed(&self) -> bool {
        !matches!(self, IndexHint::None)
    }
}

/// Table definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    /// Column number of the primary key (always 0 when present)
    pub primary_key: Option<usize>,
    pub indexes: Vec<IndexDef>,
}

impl TableDef {
    /// Create a table without keys or indexes
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        Self {
            name: name.into(),
            columns,
            primary_key: None,
            indexes: Vec::new(),
        }
    }

    /// Mark the first column as primary key
    pub fn with_primary_key(mut self) -> Self {
        self.primary_key = Some(0);
        self
    }

    /// Add a secondary index on a column
    pub fn with_index(mut self, name: impl Into<String>, column: usize) -> Self {
        self.indexes.push(IndexDef {
            name: name.into(),
            column,
        });
        self
    }

    /// Find a column number by name (case-insensitive)
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Per-column best index hint
    pub fn index_hints(&self) -> Vec<IndexHint> {
        (0..self.columns.len())
            .map(|col| {
                if self.primary_key == Some(col) {
                    return IndexHint::PrimaryKey;
                }
                self.indexes
                    .iter()
                    .position(|idx| idx.column == col)
                    .map(|ordinal| IndexHint::Secondary(ordinal as u32))
                    .unwrap_or(IndexHint::None)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uwa() -> TableDef {
        TableDef::new(
            "uwa",
            vec![
                ColumnDef::int("id"),
                ColumnDef::int("airTemp"),
                ColumnDef::int("airPres"),
                ColumnDef::int("windSpeed"),
            ],
        )
        .with_primary_key()
        .with_index("uTemp", 1)
    }

    #[test]
    fn test_index_hints() {
        let hints = uwa().index_hints();
        assert_eq!(
            hints,
            vec![
                IndexHint::PrimaryKey,
                IndexHint::Secondary(0),
                IndexHint::None,
                IndexHint::None
            ]
        );
    }

    #[test]
    fn test_column_lookup_is_case_insensitive() {
        let table = uwa();
        assert_eq!(table.column_index("AIRTEMP"), Some(1));
        assert_eq!(table.column_index("missing"), None);
    }

    #[test]
    fn test_first_index_wins() {
        let table = uwa().with_index("uTemp2", 1).with_index("uPres", 2);
        assert_eq!(table.index_hints()[1], IndexHint::Secondary(0));
        assert_eq!(table.index_hints()[2], IndexHint::Secondary(2));
    }
}
