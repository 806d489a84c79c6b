//! In-memory catalog populated from DDL
//!
//! Supported statements:
//! - CREATE TABLE with INT/BIGINT (or other, uncompilable) columns and an
//!   optional single-column PRIMARY KEY on the first column
//! - CREATE INDEX name ON table (column)
//!
//! The catalog is only mutated through `&mut self`; compiles borrow it
//! immutably.

use std::collections::BTreeMap;

use sqlparser::ast::{
    ColumnOption, CreateIndex, CreateTable, DataType, Expr, ObjectName, Statement,
    TableConstraint,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

use super::errors::{CatalogError, CatalogResult};
use super::types::{ColumnDef, DeclaredType, IndexDef, IndexHint, TableDef};
use crate::observability::{log_event_with_fields, Event};

/// Result of applying one DDL statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DdlOutcome {
    TableCreated(String),
    IndexCreated { index: String, table: String },
    /// `IF NOT EXISTS` on an existing object
    Skipped(String),
}

/// Table registry keyed by lower-cased table name
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: BTreeMap<String, TableDef>,
}

impl Catalog {
    /// Creates an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog and applies each DDL script in order
    pub fn with_ddl<'a>(scripts: impl IntoIterator<Item = &'a str>) -> CatalogResult<Self> {
        let mut catalog = Self::new();
        for script in scripts {
            catalog.execute_ddl(script)?;
        }
        Ok(catalog)
    }

    /// Registers a table definition directly
    pub fn register(&mut self, table: TableDef) -> CatalogResult<()> {
        let key = table.name.to_ascii_lowercase();
        if self.tables.contains_key(&key) {
            return Err(CatalogError::TableExists(table.name));
        }
        self.tables.insert(key, table);
        Ok(())
    }

    /// Looks up a table by name (case-insensitive)
    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.get(&name.to_ascii_lowercase())
    }

    /// Per-column index hints for a table
    pub fn index_hints(&self, name: &str) -> Option<Vec<IndexHint>> {
        self.table(name).map(TableDef::index_hints)
    }

    /// Table names in sorted order
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.values().map(|t| t.name.as_str()).collect()
    }

    /// Parses and applies a script of one or more DDL statements
    pub fn execute_ddl(&mut self, sql: &str) -> CatalogResult<Vec<DdlOutcome>> {
        let statements = Parser::parse_sql(&GenericDialect {}, sql)
            .map_err(|e| CatalogError::Syntax(e.to_string()))?;

        let mut outcomes = Vec::with_capacity(statements.len());
        for statement in statements {
            let outcome = match statement {
                Statement::CreateTable(create) => self.create_table(create),
                Statement::CreateIndex(create) => self.create_index(create),
                other => Err(CatalogError::Unsupported(first_words(&other.to_string()))),
            };

            match outcome {
                Ok(outcome) => {
                    log_event_with_fields(Event::DdlApplied, &[("outcome", &format!("{:?}", outcome))]);
                    outcomes.push(outcome);
                }
                Err(e) => {
                    log_event_with_fields(Event::DdlRejected, &[("code", e.code()), ("reason", &e.to_string())]);
                    return Err(e);
                }
            }
        }
        Ok(outcomes)
    }

    fn create_table(&mut self, create: CreateTable) -> CatalogResult<DdlOutcome> {
        let name = object_name(&create.name);
        if self.table(&name).is_some() {
            if create.if_not_exists {
                return Ok(DdlOutcome::Skipped(name));
            }
            return Err(CatalogError::TableExists(name));
        }
        if create.columns.is_empty() {
            return Err(CatalogError::Unsupported(format!(
                "table '{}' must declare at least one column",
                name
            )));
        }

        let mut columns = Vec::with_capacity(create.columns.len());
        let mut primary_key = None;
        for (i, column) in create.columns.iter().enumerate() {
            let is_primary = column.options.iter().any(|opt| {
                matches!(opt.option, ColumnOption::Unique { is_primary: true, .. })
            });
            if is_primary {
                set_primary_key(&mut primary_key, i, &name)?;
            }
            columns.push(ColumnDef::new(
                column.name.value.clone(),
                declared_type(&column.data_type),
            ));
        }

        for constraint in &create.constraints {
            if let TableConstraint::PrimaryKey {
                columns: key_columns,
                ..
            } = constraint
            {
                if key_columns.len() != 1 {
                    return Err(CatalogError::Unsupported(
                        "composite primary keys are not supported".into(),
                    ));
                }
                let col = columns
                    .iter()
                    .position(|c| c.name.eq_ignore_ascii_case(&key_columns[0].value))
                    .ok_or_else(|| CatalogError::ColumnNotFound {
                        table: name.clone(),
                        column: key_columns[0].value.clone(),
                    })?;
                set_primary_key(&mut primary_key, col, &name)?;
            }
        }

        let table = TableDef {
            name: name.clone(),
            columns,
            primary_key,
            indexes: Vec::new(),
        };
        self.tables.insert(name.to_ascii_lowercase(), table);
        Ok(DdlOutcome::TableCreated(name))
    }

    fn create_index(&mut self, create: CreateIndex) -> CatalogResult<DdlOutcome> {
        let table_name = object_name(&create.table_name);
        let table = self
            .tables
            .get_mut(&table_name.to_ascii_lowercase())
            .ok_or_else(|| CatalogError::TableNotFound(table_name.clone()))?;

        if create.columns.len() != 1 {
            return Err(CatalogError::Unsupported(
                "indexes must cover exactly one column".into(),
            ));
        }
        let column_name = match &create.columns[0].expr {
            Expr::Identifier(ident) => ident.value.clone(),
            other => {
                return Err(CatalogError::Unsupported(format!(
                    "index on expression '{}'",
                    other
                )))
            }
        };
        let column = table
            .column_index(&column_name)
            .ok_or_else(|| CatalogError::ColumnNotFound {
                table: table.name.clone(),
                column: column_name.clone(),
            })?;

        let index_name = create
            .name
            .as_ref()
            .map(object_name)
            .unwrap_or_else(|| format!("idx_{}_{}", table.name, column_name));

        if table
            .indexes
            .iter()
            .any(|idx| idx.name.eq_ignore_ascii_case(&index_name))
        {
            if create.if_not_exists {
                return Ok(DdlOutcome::Skipped(index_name));
            }
            return Err(CatalogError::IndexExists(index_name));
        }

        table.indexes.push(IndexDef {
            name: index_name.clone(),
            column,
        });
        Ok(DdlOutcome::IndexCreated {
            index: index_name,
            table: table.name.clone(),
        })
    }
}

/// The record layout puts the key first, so only column 0 can be the key.
fn set_primary_key(slot: &mut Option<usize>, col: usize, table: &str) -> CatalogResult<()> {
    if slot.is_some() {
        return Err(CatalogError::Unsupported(format!(
            "table '{}' declares more than one primary key",
            table
        )));
    }
    if col != 0 {
        return Err(CatalogError::Unsupported(format!(
            "primary key of table '{}' must be its first column",
            table
        )));
    }
    *slot = Some(col);
    Ok(())
}

fn declared_type(data_type: &DataType) -> DeclaredType {
    match data_type {
        DataType::Int(_)
        | DataType::Integer(_)
        | DataType::Int4(_)
        | DataType::UnsignedInt(_)
        | DataType::UnsignedInteger(_) => DeclaredType::Int32,
        DataType::BigInt(_) | DataType::Int8(_) | DataType::UnsignedBigInt(_) => {
            DeclaredType::Int64
        }
        other => DeclaredType::Other(other.to_string()),
    }
}

/// Last identifier of a possibly qualified name
pub(crate) fn object_name(name: &ObjectName) -> String {
    name.0
        .last()
        .map(|ident| ident.value.clone())
        .unwrap_or_default()
}

fn first_words(statement: &str) -> String {
    statement.split_whitespace().take(2).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const UWA: &str = "CREATE TABLE uwa (id INT PRIMARY KEY, airTemp INT, airPres INT, windSpeed INT)";

    #[test]
    fn test_create_table_and_index() {
        let mut catalog = Catalog::new();
        catalog.execute_ddl(UWA).unwrap();
        let outcomes = catalog.execute_ddl("CREATE INDEX uTemp ON uwa (airTemp)").unwrap();
        assert_eq!(
            outcomes,
            vec![DdlOutcome::IndexCreated {
                index: "uTemp".into(),
                table: "uwa".into()
            }]
        );

        let table = catalog.table("UWA").unwrap();
        assert_eq!(table.columns.len(), 4);
        assert_eq!(table.primary_key, Some(0));
        assert_eq!(
            catalog.index_hints("uwa").unwrap(),
            vec![
                IndexHint::PrimaryKey,
                IndexHint::Secondary(0),
                IndexHint::None,
                IndexHint::None
            ]
        );
    }

    #[test]
    fn test_multiple_statements_in_one_script() {
        let catalog = Catalog::with_ddl([
            "CREATE TABLE a (k BIGINT, v INT); CREATE TABLE b (k INT, PRIMARY KEY (k));",
        ])
        .unwrap();
        assert_eq!(catalog.table_names(), vec!["a", "b"]);
        assert_eq!(catalog.table("a").unwrap().columns[0].declared_type, DeclaredType::Int64);
        assert_eq!(catalog.table("a").unwrap().primary_key, None);
        assert_eq!(catalog.table("b").unwrap().primary_key, Some(0));
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let mut catalog = Catalog::new();
        catalog.execute_ddl(UWA).unwrap();
        let err = catalog.execute_ddl(UWA).unwrap_err();
        assert_eq!(err, CatalogError::TableExists("uwa".into()));

        let outcomes = catalog
            .execute_ddl("CREATE TABLE IF NOT EXISTS uwa (id INT)")
            .unwrap();
        assert_eq!(outcomes, vec![DdlOutcome::Skipped("uwa".into())]);
    }

    #[test]
    fn test_primary_key_must_be_first_column() {
        let mut catalog = Catalog::new();
        let err = catalog
            .execute_ddl("CREATE TABLE t (a INT, b INT PRIMARY KEY)")
            .unwrap_err();
        assert!(matches!(err, CatalogError::Unsupported(_)));
    }

    #[test]
    fn test_index_errors() {
        let mut catalog = Catalog::new();
        catalog.execute_ddl(UWA).unwrap();

        let err = catalog.execute_ddl("CREATE INDEX x ON missing (a)").unwrap_err();
        assert_eq!(err, CatalogError::TableNotFound("missing".into()));

        let err = catalog.execute_ddl("CREATE INDEX x ON uwa (nope)").unwrap_err();
        assert!(matches!(err, CatalogError::ColumnNotFound { .. }));

        let err = catalog
            .execute_ddl("CREATE INDEX x ON uwa (airTemp, airPres)")
            .unwrap_err();
        assert!(matches!(err, CatalogError::Unsupported(_)));

        catalog.execute_ddl("CREATE INDEX x ON uwa (airPres)").unwrap();
        let err = catalog.execute_ddl("CREATE INDEX x ON uwa (windSpeed)").unwrap_err();
        assert_eq!(err, CatalogError::IndexExists("x".into()));
    }

    #[test]
    fn test_non_ddl_rejected() {
        let mut catalog = Catalog::new();
        catalog.execute_ddl(UWA).unwrap();
        let err = catalog.execute_ddl("DROP TABLE uwa").unwrap_err();
        assert!(matches!(err, CatalogError::Unsupported(_)));
        let err = catalog.execute_ddl("CREATE TABLE (").unwrap_err();
        assert!(matches!(err, CatalogError::Syntax(_)));
    }

    #[test]
    fn test_other_types_are_recorded() {
        let mut catalog = Catalog::new();
        catalog
            .execute_ddl("CREATE TABLE t (id INT PRIMARY KEY, label VARCHAR(10))")
            .unwrap();
        let table = catalog.table("t").unwrap();
        assert!(matches!(table.columns[1].declared_type, DeclaredType::Other(_)));
    }
}
