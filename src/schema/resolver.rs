//! Schema resolution
//!
//! Builds the table layout from a catalog definition and the output layout
//! from a projection list. Only INT and BIGINT columns are accepted as
//! declared input; float and double columns come from aggregate output.

use crate::catalog::{DeclaredType, TableDef};
use crate::compiler::{CompileError, CompileResult};
use crate::frontend::{AggregateFunction, Projection, ProjectionKind};

use super::types::{LogicalType, Schema};

/// Stateless schema builder
pub struct SchemaResolver;

impl SchemaResolver {
    /// Layout of a stored record. Column 0 is the key and unsigned.
    pub fn table_schema(table: &TableDef) -> CompileResult<Schema> {
        let mut schema = Schema::new();
        for (i, column) in table.columns.iter().enumerate() {
            let signed = i != 0;
            let logical_type = match &column.declared_type {
                DeclaredType::Int32 => LogicalType::integer(4, signed),
                DeclaredType::Int64 => LogicalType::integer(8, signed),
                DeclaredType::Other(_) => None,
            }
            .ok_or_else(|| {
                CompileError::type_error(format!(
                    "Column '{}' of table '{}' has type {}; column types must be either INT or BIGINT",
                    column.name,
                    table.name,
                    column.declared_type.type_name()
                ))
            })?;
            schema.push(column.name.clone(), logical_type);
        }
        Ok(schema)
    }

    /// Layout of the printed result, one column per projection
    pub fn output_schema(table_schema: &Schema, projections: &[Projection]) -> CompileResult<Schema> {
        let mut schema = Schema::new();
        for (i, projection) in projections.iter().enumerate() {
            let logical_type = match &projection.kind {
                ProjectionKind::Column(col) => Self::source_type(table_schema, *col)?,
                ProjectionKind::Arithmetic(expr) => {
                    if expr.is_float() {
                        LogicalType::Double
                    } else {
                        match expr.columns().into_iter().next() {
                            Some(col) => Self::source_type(table_schema, col)?,
                            None => LogicalType::Int32,
                        }
                    }
                }
                ProjectionKind::Aggregate(call) => match call.function {
                    AggregateFunction::Count => LogicalType::UInt32,
                    AggregateFunction::Sum => LogicalType::Int64,
                    AggregateFunction::Avg => LogicalType::Float,
                    AggregateFunction::Min | AggregateFunction::Max => {
                        let col = call.argument.ok_or_else(|| {
                            CompileError::internal(format!(
                                "{} aggregate without a source column",
                                call.function.name()
                            ))
                        })?;
                        Self::source_type(table_schema, col)?
                    }
                },
                ProjectionKind::AliasOf(target) if *target < i => schema
                    .column(*target)
                    .map(|c| c.logical_type)
                    .ok_or_else(|| CompileError::internal("alias target missing from output"))?,
                ProjectionKind::AliasOf(target) => {
                    return Err(CompileError::internal(format!(
                        "projection {} aliases later projection {}",
                        i, target
                    )))
                }
            };
            schema.push(projection.name.clone(), logical_type);
        }
        Ok(schema)
    }

    fn source_type(table_schema: &Schema, col: usize) -> CompileResult<LogicalType> {
        table_schema
            .column(col)
            .map(|c| c.logical_type)
            .ok_or_else(|| CompileError::internal(format!("column {} is outside the table", col)))
    }
}
