//! Explain output
//!
//! Deterministic, human-readable summary of a compiled pipeline or of a
//! rejection.

use std::fmt;

use serde::Serialize;
use serde_json::{json, Value};

use crate::schema::Schema;

use super::aggregate::AggregateKind;
use super::errors::CompileError;
use super::predicates::IndexBound;
use super::program::{OperatorProgram, Step};

/// Explain plan output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplainPlan {
    /// Whether compilation succeeded
    pub accepted: bool,
    pub table: Option<String>,
    /// Key-side iterator bounds
    pub key_bounds: Option<String>,
    /// Data-side iterator bounds
    pub data_bounds: Option<String>,
    /// Runtime selections
    pub filters: Vec<String>,
    pub group: Option<String>,
    pub aggregates: Vec<String>,
    pub having: Option<String>,
    /// Printed columns with their print types
    pub output: Vec<String>,
    pub helpers: Vec<String>,
    pub root: Option<String>,
    /// Rejection reason (if rejected)
    pub rejection_reason: Option<String>,
    /// Rejection error code (if rejected)
    pub rejection_code: Option<String>,
}

impl ExplainPlan {
    /// Creates an explain plan from a compiled program
    pub fn from_program(program: &OperatorProgram) -> Self {
        let table_schema = program.steps.iter().find_map(|step| match step {
            Step::BuildScan { schema, .. } => Some(schema),
            _ => None,
        });
        let column_name = |col: usize| -> String {
            table_schema
                .and_then(|s: &Schema| s.column(col))
                .map(|c| c.name.clone())
                .unwrap_or_else(|| format!("col{}", col))
        };

        let predicates = &program.predicates;
        let key_bounds = predicates
            .key_column
            .map(|col| format_bound(&column_name(col), &predicates.key));
        let data_bounds = predicates
            .secondary_column
            .map(|col| format_bound(&column_name(col), &predicates.secondary));

        let filters = predicates
            .filters
            .iter()
            .map(|f| format!("{} {} {}", column_name(f.column), f.op, f.value))
            .collect();

        let (group, aggregates) = match &program.aggregate {
            None => (None, Vec::new()),
            Some(plan) => {
                let group = match &plan.group {
                    super::helpers::GroupComparison::Always => "single group".to_string(),
                    super::helpers::GroupComparison::Expression { expr, .. } => expr.to_string(),
                };
                let aggregates = plan
                    .descriptors
                    .iter()
                    .map(|d| {
                        let source = match d.source_column {
                            Some(col) if d.kind != AggregateKind::Count => column_name(col),
                            _ => "*".to_string(),
                        };
                        format!(
                            "{} = {}({}) -> {}",
                            d.output.name,
                            kind_name(d.kind),
                            source,
                            d.output.logical_type
                        )
                    })
                    .collect();
                (Some(group), aggregates)
            }
        };

        let having = match (&program.having, &program.aggregate) {
            (Some(filter), Some(plan)) => {
                let name = plan
                    .schema
                    .column(filter.column)
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| format!("col{}", filter.column));
                Some(format!("{} {} {}", name, filter.op, filter.literal))
            }
            _ => None,
        };

        Self {
            accepted: true,
            table: Some(program.table.clone()),
            key_bounds,
            data_bounds,
            filters,
            group,
            aggregates,
            having,
            output: program
                .output
                .iter()
                .map(|c| format!("{} {}", c.name, c.print_type))
                .collect(),
            helpers: program.helpers.iter().map(|h| h.name().to_string()).collect(),
            root: Some(program.root.clone()),
            rejection_reason: None,
            rejection_code: None,
        }
    }

    /// Creates an explain plan from a compile error
    pub fn from_error(err: &CompileError) -> Self {
        Self {
            accepted: false,
            table: None,
            key_bounds: None,
            data_bounds: None,
            filters: Vec::new(),
            group: None,
            aggregates: Vec::new(),
            having: None,
            output: Vec::new(),
            helpers: Vec::new(),
            root: None,
            rejection_reason: Some(err.message().to_string()),
            rejection_code: Some(err.code().code().to_string()),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "accepted": self.accepted,
            "table": self.table,
            "key_bounds": self.key_bounds,
            "data_bounds": self.data_bounds,
            "filters": self.filters,
            "group": self.group,
            "aggregates": self.aggregates,
            "having": self.having,
            "output": self.output,
            "helpers": self.helpers,
            "root": self.root,
            "rejection_reason": self.rejection_reason,
            "rejection_code": self.rejection_code,
        })
    }
}

fn kind_name(kind: AggregateKind) -> &'static str {
    match kind {
        AggregateKind::Min => "min",
        AggregateKind::Max => "max",
        AggregateKind::Sum => "sum",
        AggregateKind::Count => "count",
        AggregateKind::Avg => "avg",
        AggregateKind::CustomGroupExpr => "group",
    }
}

fn format_bound(name: &str, bound: &IndexBound) -> String {
    match (bound.min, bound.max) {
        (Some(min), Some(max)) => format!("{} <= {} <= {}", min, name, max),
        (Some(min), None) => format!("{} >= {}", name, min),
        (None, Some(max)) => format!("{} <= {}", name, max),
        (None, None) => format!("{} unbounded", name),
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN PLAN ===")?;

        if !self.accepted {
            writeln!(f, "Status: REJECTED")?;
            if let Some(code) = &self.rejection_code {
                writeln!(f, "Error Code: {}", code)?;
            }
            if let Some(reason) = &self.rejection_reason {
                writeln!(f, "Reason: {}", reason)?;
            }
            return Ok(());
        }

        writeln!(f, "Status: ACCEPTED")?;
        if let Some(table) = &self.table {
            writeln!(f, "Table: {}", table)?;
        }
        writeln!(f, "Key Bounds: {}", self.key_bounds.as_deref().unwrap_or("none"))?;
        writeln!(f, "Data Bounds: {}", self.data_bounds.as_deref().unwrap_or("none"))?;
        if !self.filters.is_empty() {
            writeln!(f, "Filters:")?;
            for filter in &self.filters {
                writeln!(f, "  - {}", filter)?;
            }
        }
        if let Some(group) = &self.group {
            writeln!(f, "Group: {}", group)?;
            writeln!(f, "Aggregates:")?;
            for aggregate in &self.aggregates {
                writeln!(f, "  - {}", aggregate)?;
            }
        }
        if let Some(having) = &self.having {
            writeln!(f, "Having: {}", having)?;
        }
        writeln!(f, "Output:")?;
        for column in &self.output {
            writeln!(f, "  - {}", column)?;
        }
        if !self.helpers.is_empty() {
            writeln!(f, "Helpers: {}", self.helpers.join(", "))?;
        }
        if let Some(root) = &self.root {
            writeln!(f, "Root: {}", root)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::compiler::QueryCompiler;

    fn catalog() -> Catalog {
        Catalog::with_ddl([
            "CREATE TABLE uwa (id INT PRIMARY KEY, airTemp INT, airPres INT, windSpeed INT)",
            "CREATE INDEX uTemp ON uwa (airTemp)",
        ])
        .unwrap()
    }

    #[test]
    fn test_explain_accepted_plan() {
        let catalog = catalog();
        let program = QueryCompiler::new(&catalog)
            .plan_sql("SELECT id, airTemp FROM uwa WHERE id >= 100 AND airTemp > 20 AND windSpeed != 3")
            .unwrap();
        let explain = ExplainPlan::from_program(&program);

        assert!(explain.accepted);
        assert_eq!(explain.key_bounds, Some("id >= 100".into()));
        assert_eq!(explain.data_bounds, Some("airTemp >= 21".into()));
        assert_eq!(explain.filters, vec!["windSpeed != 3".to_string()]);
        assert_eq!(explain.root, Some("selectNEQwindSpeed".into()));

        let output = explain.to_string();
        assert!(output.contains("Status: ACCEPTED"));
        assert!(output.contains("Table: uwa"));
    }

    #[test]
    fn test_explain_aggregates() {
        let catalog = catalog();
        let program = QueryCompiler::new(&catalog)
            .plan_sql("SELECT airTemp, count(*) FROM uwa GROUP BY airTemp HAVING count(*) > 2")
            .unwrap();
        let explain = ExplainPlan::from_program(&program);

        assert_eq!(explain.group, Some("col1".into()));
        assert_eq!(
            explain.aggregates,
            vec![
                "airTemp = group(airTemp) -> int32_t".to_string(),
                "count = count(*) -> uint32_t".to_string()
            ]
        );
        assert_eq!(explain.having, Some("count > 2".into()));
    }

    #[test]
    fn test_explain_rejected_plan() {
        let err = CompileError::unsupported_shape("OR predicates are not supported");
        let explain = ExplainPlan::from_error(&err);

        assert!(!explain.accepted);
        let output = explain.to_string();
        assert!(output.contains("Status: REJECTED"));
        assert!(output.contains("EMBEDDB_UNSUPPORTED_QUERY_SHAPE"));
        assert_eq!(explain.to_json()["rejection_code"], "EMBEDDB_UNSUPPORTED_QUERY_SHAPE");
    }

    #[test]
    fn test_explain_deterministic() {
        let catalog = catalog();
        let compiler = QueryCompiler::new(&catalog);
        let sql = "SELECT min(airTemp), max(airTemp) FROM uwa WHERE id < 500";
        let first = ExplainPlan::from_program(&compiler.plan_sql(sql).unwrap()).to_string();
        let second = ExplainPlan::from_program(&compiler.plan_sql(sql).unwrap()).to_string();
        assert_eq!(first, second);
    }
}
