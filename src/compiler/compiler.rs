//! Query compiler
//!
//! `plan` turns an `AnalyzedQuery` into a complete `OperatorProgram`;
//! `CodeEmitter::emit` renders it. A compile call either returns the whole
//! program text or exactly one error.

use crate::catalog::Catalog;
use crate::frontend::{analyze, AnalyzedQuery};
use crate::observability::{log_event_with_fields, Event, ObservationScope};
use crate::schema::SchemaResolver;

use super::aggregate::AggregatePlanner;
use super::emitter::CodeEmitter;
use super::errors::{CompileError, CompileResult};
use super::having::HavingFilterBuilder;
use super::helpers::HelperSet;
use super::predicates::PredicateClassifier;
use super::program::{OperatorProgram, OperatorTreeAssembler, ProgramParts};

/// Compiles SQL against a catalog it borrows for its whole lifetime
pub struct QueryCompiler<'a> {
    catalog: &'a Catalog,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Resolve SQL text into an `AnalyzedQuery`
    pub fn analyze(&self, sql: &str) -> CompileResult<AnalyzedQuery> {
        analyze(self.catalog, sql)
    }

    /// Analyze and plan SQL text
    pub fn plan_sql(&self, sql: &str) -> CompileResult<OperatorProgram> {
        let query = self.analyze(sql)?;
        Self::plan(&query)
    }

    /// Compile SQL text into program text
    pub fn compile(&self, sql: &str) -> CompileResult<String> {
        log_event_with_fields(Event::CompileBegin, &[("sql", sql)]);

        let result = self
            .analyze(sql)
            .and_then(|query| Self::compile_analyzed(&query));

        match &result {
            Ok(text) => log_event_with_fields(
                Event::CompileComplete,
                &[("bytes", &text.len().to_string())],
            ),
            Err(err) => log_event_with_fields(
                Event::CompileRejected,
                &[("code", err.code().code()), ("reason", err.message())],
            ),
        }
        result
    }

    /// Plan and emit an already analyzed query
    pub fn compile_analyzed(query: &AnalyzedQuery) -> CompileResult<String> {
        let program = Self::plan(query)?;
        CodeEmitter::emit(&program)
    }

    /// Build the complete operator program for one query
    pub fn plan(query: &AnalyzedQuery) -> CompileResult<OperatorProgram> {
        let scope = ObservationScope::new("PLAN");
        match Self::build(query) {
            Ok(program) => {
                scope.complete_with_fields(&[
                    ("table", &program.table),
                    ("root", &program.root),
                    ("steps", &program.steps.len().to_string()),
                ]);
                Ok(program)
            }
            Err(err) => {
                scope.fail(err.code().code(), err.message());
                Err(err)
            }
        }
    }

    fn build(query: &AnalyzedQuery) -> CompileResult<OperatorProgram> {
        let predicates = PredicateClassifier::classify(query)?;
        let table = query
            .table()
            .ok_or_else(|| CompileError::internal("query has no table"))?;

        let table_schema = SchemaResolver::table_schema(table)?;
        let mut output_schema = SchemaResolver::output_schema(&table_schema, &query.projections)?;
        let mut helpers = HelperSet::new();

        let aggregate = if query.is_grouped() {
            Some(AggregatePlanner::new(query, &table_schema, &mut helpers).plan(&mut output_schema)?)
        } else {
            if !query.having.is_empty() {
                return Err(CompileError::unsupported_shape(
                    "HAVING requires an aggregate or GROUP BY",
                ));
            }
            None
        };

        let having = match (query.having.first(), &aggregate) {
            (Some(having), Some(plan)) => {
                let column = plan
                    .having_column
                    .ok_or_else(|| CompileError::internal("HAVING target was not planned"))?;
                Some(HavingFilterBuilder::build(having, column, &plan.schema)?)
            }
            _ => None,
        };

        let mut assembler = OperatorTreeAssembler::new(&table.name, &table_schema);
        assembler.scan(&predicates)?;
        assembler.selections(&predicates.filters)?;
        if let Some(plan) = &aggregate {
            assembler.aggregate(plan);
        }
        if let Some(filter) = &having {
            assembler.having(filter);
        }

        assembler.finish(
            ProgramParts {
                projections: &query.projections,
                output_schema: &output_schema,
                predicates,
                aggregate,
                having,
            },
            helpers,
        )
    }
}

/// Compile one SELECT statement against `catalog`
pub fn compile(catalog: &Catalog, sql: &str) -> CompileResult<String> {
    QueryCompiler::new(catalog).compile(sql)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{CompileErrorCode, Step};
    use crate::frontend::{CompareOp, HavingExpr, HavingOperand, Literal, ProjectionKind};

    fn catalog() -> Catalog {
        Catalog::with_ddl([
            "CREATE TABLE uwa (id INT PRIMARY KEY, airTemp INT, airPres INT, windSpeed INT)",
            "CREATE INDEX uTemp ON uwa (airTemp)",
        ])
        .unwrap()
    }

    #[test]
    fn test_plan_steps_in_order() {
        let catalog = catalog();
        let program = QueryCompiler::new(&catalog)
            .plan_sql("SELECT * FROM uwa WHERE id > 10 AND windSpeed = 4")
            .unwrap();
        let kinds: Vec<&str> = program
            .steps
            .iter()
            .map(|s| match s {
                Step::AllocateLiteral { .. } => "alloc",
                Step::BuildIndexIterator { .. } => "iterator",
                Step::BuildScan { .. } => "scan",
                Step::BuildSelection { .. } => "select",
                Step::BuildAggregate { .. } => "aggregate",
                Step::BuildHaving { .. } => "having",
            })
            .collect();
        assert_eq!(kinds, vec!["alloc", "iterator", "scan", "alloc", "select"]);
        assert_eq!(program.root, "selectEQwindSpeed");
        assert_eq!(program.allocations, vec!["minKey", "it", "selValEQwindSpeed"]);
        assert!(program.aggregate.is_none());
    }

    #[test]
    fn test_having_without_aggregate_rejected() {
        let catalog = catalog();
        let table = catalog.table("uwa").unwrap().clone();
        let mut query = AnalyzedQuery::over(table).select_all();
        query.having.push(HavingExpr::Comparison {
            op: CompareOp::Gt,
            left: HavingOperand::Projected(ProjectionKind::Column(1)),
            right: HavingOperand::Literal(Literal::Integer(3)),
        });
        let err = QueryCompiler::plan(&query).unwrap_err();
        assert_eq!(err.code(), CompileErrorCode::UnsupportedQueryShape);
    }

    #[test]
    fn test_compile_is_all_or_nothing() {
        let catalog = catalog();
        let err = compile(&catalog, "SELECT * FROM uwa WHERE airTemp > 1.5").unwrap_err();
        assert_eq!(err.code(), CompileErrorCode::TypeError);
    }

    #[test]
    fn test_having_operator_on_top() {
        let catalog = catalog();
        let program = QueryCompiler::new(&catalog)
            .plan_sql("SELECT airTemp, max(airPres) FROM uwa GROUP BY airTemp HAVING max(airPres) > 900")
            .unwrap();
        assert_eq!(program.root, "havingOp");
        assert_eq!(
            program.allocations,
            vec!["it", "aggFuncs", "havingValue"]
        );
        assert_eq!(program.transient, vec!["group0", "max1"]);
    }
}
