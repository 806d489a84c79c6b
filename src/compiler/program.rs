//! Operator tree assembly
//!
//! Sequences the construction steps of one pipeline and records every heap
//! allocation the generated code makes:
//! - tracked allocations live until the driver tears the pipeline down
//! - transient allocations (aggregate descriptors) are freed as soon as they
//!   are copied into the packed descriptor array
//!
//! The resulting `OperatorProgram` is complete: the emitter only renders it.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::frontend::{CompareOp, Literal, Projection, ProjectionKind, ScalarExpr};
use crate::schema::{LogicalType, Schema};

use super::aggregate::{AggregateDescriptor, AggregatePlan};
use super::arithmetic::{ArithmeticExpr, ArithmeticTranslator};
use super::errors::{CompileError, CompileResult};
use super::having::HavingFilter;
use super::helpers::HelperSet;
use super::predicates::{ClassifiedPredicates, FilterPredicate};

/// Identifiers the generated procedures declare themselves
const FIXED_NAMES: &[&str] = &[
    "state",
    "allocatedValues",
    "minKey",
    "maxKey",
    "minData",
    "maxData",
    "it",
    "numCols",
    "colSizes",
    "colSignedness",
    "schema",
    "scanOp",
    "aggFuncs",
    "aggOp",
    "havingValue",
    "havingOp",
    "groupFunction",
];

/// One construction step of `createOperator`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Step {
    /// Heap-allocate a literal of the given storage type
    AllocateLiteral {
        variable: String,
        storage_type: LogicalType,
        value: Literal,
    },
    /// Iterator with optional key and data bounds
    BuildIndexIterator {
        min_key: Option<String>,
        max_key: Option<String>,
        min_data: Option<String>,
        max_data: Option<String>,
    },
    /// Table scan over the stored record layout
    BuildScan { schema: Schema, variable: String },
    BuildSelection {
        variable: String,
        input: String,
        column: usize,
        op: CompareOp,
        value_variable: String,
    },
    /// Descriptors, packed array and aggregate operator
    BuildAggregate {
        input: String,
        descriptors: Vec<AggregateDescriptor>,
        packed: String,
        variable: String,
    },
    /// Selection over the aggregate output record
    BuildHaving {
        variable: String,
        input: String,
        column: usize,
        op: CompareOp,
        value_variable: String,
    },
}

/// One printed column of the driver
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputColumn {
    /// Also the name of the column pointer in the driver
    pub name: String,
    /// Type and offset the pointer reads at; `None` for constant expressions
    pub pointer: Option<(LogicalType, usize)>,
    /// Type the value is printed as
    pub print_type: LogicalType,
    /// Expression over the pointed-to value, for non-grouped arithmetic
    pub expression: Option<ArithmeticExpr>,
}

impl OutputColumn {
    /// C expression passed to `printf`
    pub fn value_expression(&self) -> String {
        let access = format!("*{}", self.name);
        match &self.expression {
            Some(expr) => format!("({})({})", self.print_type.c_type(), expr.format_with(&access)),
            None => access,
        }
    }
}

/// Fully resolved pipeline of one query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperatorProgram {
    pub table: String,
    pub steps: Vec<Step>,
    /// Variable holding the top operator
    pub root: String,
    /// Freed by the driver at teardown, in this order
    pub allocations: Vec<String>,
    /// Freed right after packing
    pub transient: Vec<String>,
    pub helpers: HelperSet,
    pub output: Vec<OutputColumn>,
    pub predicates: ClassifiedPredicates,
    pub aggregate: Option<AggregatePlan>,
    pub having: Option<HavingFilter>,
}

/// Hands out C identifiers unique within one procedure
#[derive(Debug, Clone)]
pub struct NameAllocator {
    used: BTreeSet<String>,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self {
            used: FIXED_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// `base`, or `base_2`, `base_3`, ... if taken
    pub fn fresh(&mut self, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut n = 2;
        while self.used.contains(&candidate) {
            candidate = format!("{}_{}", base, n);
            n += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}

impl Default for NameAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds an `OperatorProgram` step by step
pub struct OperatorTreeAssembler<'a> {
    table: &'a str,
    table_schema: &'a Schema,
    names: NameAllocator,
    steps: Vec<Step>,
    allocations: Vec<String>,
    transient: Vec<String>,
    top: String,
}

impl<'a> OperatorTreeAssembler<'a> {
    pub fn new(table: &'a str, table_schema: &'a Schema) -> Self {
        Self {
            table,
            table_schema,
            names: NameAllocator::new(),
            steps: Vec::new(),
            allocations: Vec::new(),
            transient: Vec::new(),
            top: String::new(),
        }
    }

    /// Bound literals, iterator and scan
    pub fn scan(&mut self, predicates: &ClassifiedPredicates) -> CompileResult<()> {
        let key_type = match predicates.key_column {
            Some(col) => Some(self.column_type(col)?),
            None => None,
        };
        let data_type = match predicates.secondary_column {
            Some(col) => Some(self.column_type(col)?),
            None => None,
        };

        let min_key = self.bound_literal("minKey", key_type, predicates.key.min)?;
        let max_key = self.bound_literal("maxKey", key_type, predicates.key.max)?;
        let min_data = self.bound_literal("minData", data_type, predicates.secondary.min)?;
        let max_data = self.bound_literal("maxData", data_type, predicates.secondary.max)?;

        self.steps.push(Step::BuildIndexIterator {
            min_key,
            max_key,
            min_data,
            max_data,
        });
        self.allocations.push("it".to_string());

        self.steps.push(Step::BuildScan {
            schema: self.table_schema.clone(),
            variable: "scanOp".to_string(),
        });
        self.top = "scanOp".to_string();
        Ok(())
    }

    fn column_type(&self, col: usize) -> CompileResult<LogicalType> {
        self.table_schema
            .column(col)
            .map(|c| c.logical_type)
            .ok_or_else(|| CompileError::internal(format!("column {} is outside the table", col)))
    }

    fn bound_literal(
        &mut self,
        variable: &str,
        storage_type: Option<LogicalType>,
        value: Option<i64>,
    ) -> CompileResult<Option<String>> {
        let value = match value {
            Some(v) => v,
            None => return Ok(None),
        };
        let storage_type = storage_type
            .ok_or_else(|| CompileError::internal(format!("{} set without a bounded column", variable)))?;
        self.steps.push(Step::AllocateLiteral {
            variable: variable.to_string(),
            storage_type,
            value: Literal::Integer(value),
        });
        self.allocations.push(variable.to_string());
        Ok(Some(variable.to_string()))
    }

    /// One selection per runtime filter, in order
    pub fn selections(&mut self, filters: &[FilterPredicate]) -> CompileResult<()> {
        let table_schema = self.table_schema;
        for filter in filters {
            let column = table_schema
                .column(filter.column)
                .ok_or_else(|| CompileError::internal(format!("filter on unknown column {}", filter.column)))?;
            let suffix = format!("{}{}", filter.op.suffix(), column.name);
            let value_variable = self.names.fresh(&format!("selVal{}", suffix));
            let variable = self.names.fresh(&format!("select{}", suffix));

            self.steps.push(Step::AllocateLiteral {
                variable: value_variable.clone(),
                storage_type: column.logical_type,
                value: Literal::Integer(filter.value),
            });
            self.allocations.push(value_variable.clone());
            self.steps.push(Step::BuildSelection {
                variable: variable.clone(),
                input: self.top.clone(),
                column: filter.column,
                op: filter.op,
                value_variable,
            });
            self.top = variable;
        }
        Ok(())
    }

    pub fn aggregate(&mut self, plan: &AggregatePlan) {
        self.transient
            .extend(plan.descriptors.iter().map(|d| d.variable.clone()));
        self.allocations.push("aggFuncs".to_string());
        self.steps.push(Step::BuildAggregate {
            input: self.top.clone(),
            descriptors: plan.descriptors.clone(),
            packed: "aggFuncs".to_string(),
            variable: "aggOp".to_string(),
        });
        self.top = "aggOp".to_string();
    }

    pub fn having(&mut self, filter: &HavingFilter) {
        self.steps.push(Step::AllocateLiteral {
            variable: "havingValue".to_string(),
            storage_type: filter.storage_type,
            value: filter.literal.clone(),
        });
        self.allocations.push("havingValue".to_string());
        self.steps.push(Step::BuildHaving {
            variable: "havingOp".to_string(),
            input: self.top.clone(),
            column: filter.column,
            op: filter.op,
            value_variable: "havingValue".to_string(),
        });
        self.top = "havingOp".to_string();
    }

    /// Resolve the driver's output columns and seal the program
    pub fn finish(
        self,
        parts: ProgramParts<'_>,
        mut helpers: HelperSet,
    ) -> CompileResult<OperatorProgram> {
        let output = match &parts.aggregate {
            Some(plan) => grouped_output(parts.output_schema, plan)?,
            None => scan_output(parts.projections, self.table_schema, parts.output_schema, &mut helpers)?,
        };

        Ok(OperatorProgram {
            table: self.table.to_string(),
            steps: self.steps,
            root: self.top,
            allocations: self.allocations,
            transient: self.transient,
            helpers,
            output,
            predicates: parts.predicates,
            aggregate: parts.aggregate,
            having: parts.having,
        })
    }
}

/// Planner results the finished program carries
pub struct ProgramParts<'a> {
    pub projections: &'a [Projection],
    pub output_schema: &'a Schema,
    pub predicates: ClassifiedPredicates,
    pub aggregate: Option<AggregatePlan>,
    pub having: Option<HavingFilter>,
}

/// Pointers into the aggregate output record
fn grouped_output(output_schema: &Schema, plan: &AggregatePlan) -> CompileResult<Vec<OutputColumn>> {
    output_schema
        .iter()
        .zip(&plan.projection_columns)
        .map(|(column, &index)| {
            let source = plan
                .schema
                .column(index)
                .ok_or_else(|| CompileError::internal(format!("descriptor {} has no output column", index)))?;
            Ok(OutputColumn {
                name: column.name.clone(),
                pointer: Some((source.logical_type, source.byte_offset)),
                print_type: source.logical_type,
                expression: None,
            })
        })
        .collect()
}

/// Pointers into the scanned record; arithmetic is evaluated in the driver
fn scan_output(
    projections: &[Projection],
    table_schema: &Schema,
    output_schema: &Schema,
    helpers: &mut HelperSet,
) -> CompileResult<Vec<OutputColumn>> {
    let mut output: Vec<OutputColumn> = Vec::with_capacity(projections.len());
    for (i, projection) in projections.iter().enumerate() {
        let print_type = output_schema
            .column(i)
            .map(|c| c.logical_type)
            .ok_or_else(|| CompileError::internal(format!("projection {} has no output column", i)))?;

        let kind = match &projection.kind {
            ProjectionKind::AliasOf(target) => projections
                .get(*target)
                .map(|p| &p.kind)
                .ok_or_else(|| CompileError::internal(format!("alias of unknown projection {}", target)))?,
            kind => kind,
        };

        let column = match kind {
            ProjectionKind::Column(col) => {
                let source = table_schema
                    .column(*col)
                    .ok_or_else(|| CompileError::internal(format!("column {} is outside the table", col)))?;
                OutputColumn {
                    name: projection.name.clone(),
                    pointer: Some((source.logical_type, source.byte_offset)),
                    print_type,
                    expression: None,
                }
            }
            ProjectionKind::Arithmetic(expr) => arithmetic_output(&projection.name, expr, print_type, table_schema, helpers)?,
            ProjectionKind::Aggregate(_) | ProjectionKind::AliasOf(_) => {
                return Err(CompileError::internal(format!(
                    "projection '{}' cannot be printed without an aggregate operator",
                    projection.name
                )))
            }
        };
        output.push(column);
    }
    Ok(output)
}

fn arithmetic_output(
    name: &str,
    expr: &ScalarExpr,
    print_type: LogicalType,
    table_schema: &Schema,
    helpers: &mut HelperSet,
) -> CompileResult<OutputColumn> {
    let translated = ArithmeticTranslator::new(helpers).translate(expr)?;
    let pointer = match translated.column() {
        Some(col) => {
            let source = table_schema
                .column(col)
                .ok_or_else(|| CompileError::internal(format!("column {} is outside the table", col)))?;
            Some((source.logical_type, source.byte_offset))
        }
        None => None,
    };
    Ok(OutputColumn {
        name: name.to_string(),
        pointer,
        print_type,
        expression: Some(translated),
    })
}
