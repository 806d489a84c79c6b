//! Aggregate planning
//!
//! For aggregated or grouped queries, builds one aggregate descriptor per
//! distinct projected value (plus the HAVING operand when it is not
//! projected) and the record layout the aggregate operator produces.
//!
//! Non-aggregate projections must equal the single GROUP BY expression; they
//! are computed by a generated callback that evaluates the expression on the
//! last record of the group.

use serde::Serialize;

use crate::frontend::{
    AggregateCall, AggregateFunction, AnalyzedQuery, HavingExpr, HavingOperand, ProjectionKind,
    ScalarExpr,
};
use crate::schema::{Column, LogicalType, Schema};

use super::arithmetic::{ArithmeticExpr, ArithmeticTranslator};
use super::errors::{CompileError, CompileResult};
use super::helpers::{GroupComparison, HelperRoutine, HelperSet};

/// Kind of per-group output value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AggregateKind {
    Min,
    Max,
    Sum,
    Count,
    Avg,
    /// Group key computed by a generated callback
    CustomGroupExpr,
}

/// One per-group output column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateDescriptor {
    pub kind: AggregateKind,
    pub source_column: Option<usize>,
    pub source_type: Option<LogicalType>,
    /// Layout of the value in the aggregate output record
    pub output: Column,
    /// C variable holding the descriptor in `createOperator`
    pub variable: String,
    /// Compute callback for `CustomGroupExpr`
    pub compute: Option<String>,
}

/// Result of aggregate planning
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatePlan {
    pub group: GroupComparison,
    /// Emission order
    pub descriptors: Vec<AggregateDescriptor>,
    /// Record layout produced by the aggregate operator
    pub schema: Schema,
    /// Descriptor index for each projection
    pub projection_columns: Vec<usize>,
    /// Descriptor index the HAVING filter reads
    pub having_column: Option<usize>,
}

/// Plans the aggregate operator of one query
pub struct AggregatePlanner<'a> {
    query: &'a AnalyzedQuery,
    table_schema: &'a Schema,
    helpers: &'a mut HelperSet,
}

impl<'a> AggregatePlanner<'a> {
    pub fn new(query: &'a AnalyzedQuery, table_schema: &'a Schema, helpers: &'a mut HelperSet) -> Self {
        Self {
            query,
            table_schema,
            helpers,
        }
    }

    /// Build descriptors and retype `output_schema` to the aggregate layout
    pub fn plan(mut self, output_schema: &mut Schema) -> CompileResult<AggregatePlan> {
        let query = self.query;
        if query.group_by.len() > 1 {
            return Err(CompileError::unsupported_shape(
                "grouping by multiple expressions is not supported",
            ));
        }
        if query.having.len() > 1 {
            return Err(CompileError::unsupported_shape(
                "multiple HAVING conditions are not supported",
            ));
        }

        let group_expr = self.group_expression()?;
        let group = match &group_expr {
            None => GroupComparison::Always,
            Some((expr, col)) => {
                let column = self.table_column(*col)?;
                GroupComparison::Expression {
                    expr: expr.clone(),
                    column_type: column.logical_type,
                    offset: column.byte_offset,
                }
            }
        };
        self.helpers
            .register(HelperRoutine::GroupFunction(group.clone()));

        let mut processed: Vec<ProjectionKind> = Vec::new();
        let mut descriptors = Vec::new();
        let mut schema = Schema::new();
        let mut projection_columns: Vec<usize> = Vec::new();

        for projection in &query.projections {
            if let ProjectionKind::AliasOf(target) = projection.kind {
                let index = projection_columns.get(target).copied().ok_or_else(|| {
                    CompileError::internal(format!("alias of unknown projection {}", target))
                })?;
                projection_columns.push(index);
                continue;
            }

            let index = descriptors.len();
            let descriptor =
                self.descriptor(&projection.kind, &projection.name, index, &group_expr, &mut schema)?;
            descriptors.push(descriptor);
            processed.push(projection.kind.clone());
            projection_columns.push(index);
        }

        let having_column = match query.having.first() {
            None => None,
            Some(having) => {
                let kind = having_operand(having)?;
                match processed.iter().position(|k| k == kind) {
                    Some(index) => Some(index),
                    None => {
                        let index = descriptors.len();
                        let descriptor =
                            self.descriptor(kind, "having", index, &group_expr, &mut schema)?;
                        descriptors.push(descriptor);
                        Some(index)
                    }
                }
            }
        };

        for (i, &index) in projection_columns.iter().enumerate() {
            if let Some(column) = schema.column(index) {
                output_schema.retype(i, column.logical_type);
            }
        }

        Ok(AggregatePlan {
            group,
            descriptors,
            schema,
            projection_columns,
            having_column,
        })
    }

    fn group_expression(&mut self) -> CompileResult<Option<(ArithmeticExpr, usize)>> {
        let query = self.query;
        let expr = match query.group_by.first() {
            None => return Ok(None),
            Some(expr) => expr,
        };
        let translated = ArithmeticTranslator::new(self.helpers).translate(expr)?;
        let col = translated.column().ok_or_else(|| {
            CompileError::unsupported_shape("GROUP BY expression must reference a column")
        })?;
        Ok(Some((translated, col)))
    }

    fn table_column(&self, col: usize) -> CompileResult<&'a Column> {
        self.table_schema
            .column(col)
            .ok_or_else(|| CompileError::internal(format!("column {} is outside the table", col)))
    }

    fn descriptor(
        &mut self,
        kind: &ProjectionKind,
        name: &str,
        index: usize,
        group_expr: &Option<(ArithmeticExpr, usize)>,
        schema: &mut Schema,
    ) -> CompileResult<AggregateDescriptor> {
        match kind {
            ProjectionKind::Aggregate(call) => self.aggregate_descriptor(call, name, index, schema),
            ProjectionKind::Column(col) => {
                self.group_descriptor(&ScalarExpr::Column(*col), name, index, group_expr, schema)
            }
            ProjectionKind::Arithmetic(expr) => {
                self.group_descriptor(expr, name, index, group_expr, schema)
            }
            ProjectionKind::AliasOf(_) => Err(CompileError::internal(
                "alias reached descriptor construction",
            )),
        }
    }

    fn aggregate_descriptor(
        &self,
        call: &AggregateCall,
        name: &str,
        index: usize,
        schema: &mut Schema,
    ) -> CompileResult<AggregateDescriptor> {
        let source = match call.argument {
            Some(col) => Some((col, self.table_column(col)?.logical_type)),
            None => None,
        };
        let require_source = || {
            source.ok_or_else(|| {
                CompileError::internal(format!("{} without a source column", call.function.name()))
            })
        };

        let (kind, output_type, variable) = match call.function {
            AggregateFunction::Min => (AggregateKind::Min, require_source()?.1, format!("min{}", index)),
            AggregateFunction::Max => (AggregateKind::Max, require_source()?.1, format!("max{}", index)),
            AggregateFunction::Count => (AggregateKind::Count, LogicalType::UInt32, format!("counter{}", index)),
            AggregateFunction::Sum => {
                require_source()?;
                (AggregateKind::Sum, LogicalType::Int64, format!("sum{}", index))
            }
            AggregateFunction::Avg => {
                require_source()?;
                (AggregateKind::Avg, LogicalType::Float, format!("avg{}", index))
            }
        };

        let position = schema.push(name, output_type);
        Ok(AggregateDescriptor {
            kind,
            source_column: source.map(|(col, _)| col),
            source_type: source.map(|(_, t)| t),
            output: schema.column(position).cloned().ok_or_else(|| CompileError::internal("lost column"))?,
            variable,
            compute: None,
        })
    }

    fn group_descriptor(
        &mut self,
        expr: &ScalarExpr,
        name: &str,
        index: usize,
        group_expr: &Option<(ArithmeticExpr, usize)>,
        schema: &mut Schema,
    ) -> CompileResult<AggregateDescriptor> {
        let group_by = self.query.group_by.first();
        let (group, col) = match (group_expr, group_by) {
            (Some((group, col)), Some(group_by)) if group_by == expr => (group, *col),
            _ => {
                return Err(CompileError::unsupported_shape(format!(
                    "column '{}' must be aggregated or match the GROUP BY expression",
                    name
                )))
            }
        };

        let source = self.table_column(col)?;
        let output_type = if group.is_float() {
            LogicalType::floating(source.byte_size).ok_or_else(|| {
                CompileError::internal(format!("no float type of {} bytes", source.byte_size))
            })?
        } else {
            source.logical_type
        };

        let function = format!("customAggregateFunc{}", index);
        self.helpers.register(HelperRoutine::GroupCompute {
            name: function.clone(),
            expr: group.clone(),
            source_type: source.logical_type,
            source_offset: source.byte_offset,
            output_type,
        });

        let position = schema.push(name, output_type);
        Ok(AggregateDescriptor {
            kind: AggregateKind::CustomGroupExpr,
            source_column: Some(col),
            source_type: Some(source.logical_type),
            output: schema.column(position).cloned().ok_or_else(|| CompileError::internal("lost column"))?,
            variable: format!("group{}", index),
            compute: Some(function),
        })
    }
}

/// The projected side of the HAVING comparison
fn having_operand(having: &HavingExpr) -> CompileResult<&ProjectionKind> {
    match having {
        HavingExpr::Comparison { left, right, .. } => match (left, right) {
            (HavingOperand::Projected(kind), _) | (_, HavingOperand::Projected(kind)) => Ok(kind),
            _ => Err(CompileError::unsupported_shape(
                "HAVING must compare a projected column with a literal",
            )),
        },
        HavingExpr::Unsupported(text) => Err(CompileError::unsupported_shape(format!(
            "HAVING clause must be a simple comparison: '{}'",
            text
        ))),
    }
}
