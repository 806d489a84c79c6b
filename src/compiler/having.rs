//! HAVING filter construction
//!
//! The single HAVING comparison becomes a selection over the aggregate
//! output record. A literal on the left is moved to the right by flipping
//! the operator.

use serde::Serialize;

use crate::frontend::{CompareOp, HavingExpr, HavingOperand, Literal};
use crate::schema::{LogicalType, Schema};

use super::errors::{CompileError, CompileResult};

/// Post-aggregate selection `column OP literal`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HavingFilter {
    /// Column of the aggregate output record
    pub column: usize,
    pub op: CompareOp,
    pub literal: Literal,
    pub storage_type: LogicalType,
}

pub struct HavingFilterBuilder;

impl HavingFilterBuilder {
    pub fn build(having: &HavingExpr, column: usize, aggregate_schema: &Schema) -> CompileResult<HavingFilter> {
        let (op, literal) = match having {
            HavingExpr::Comparison { op, left, right } => match (left, right) {
                (HavingOperand::Projected(_), HavingOperand::Literal(literal)) => (*op, literal),
                (HavingOperand::Literal(literal), HavingOperand::Projected(_)) => (op.flip(), literal),
                _ => {
                    return Err(CompileError::unsupported_shape(
                        "HAVING must compare a projected column with a literal",
                    ))
                }
            },
            HavingExpr::Unsupported(text) => {
                return Err(CompileError::unsupported_shape(format!(
                    "HAVING clause must be a simple comparison: '{}'",
                    text
                )))
            }
        };

        let storage_type = aggregate_schema
            .column(column)
            .map(|c| c.logical_type)
            .ok_or_else(|| CompileError::internal(format!("HAVING column {} is missing", column)))?;

        match literal {
            Literal::Text(_) => {
                return Err(CompileError::type_error(format!(
                    "HAVING value {} must be numeric",
                    literal
                )))
            }
            Literal::Decimal(_) if !storage_type.is_float() => {
                return Err(CompileError::type_error(format!(
                    "HAVING value {} must be an integer for a {} column",
                    literal, storage_type
                )))
            }
            _ => {}
        }

        Ok(HavingFilter {
            column,
            op,
            literal: literal.clone(),
            storage_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::CompileErrorCode;
    use crate::frontend::{AggregateCall, AggregateFunction, ProjectionKind};

    fn schema() -> Schema {
        let mut schema = Schema::new();
        schema.push("airTemp", LogicalType::Int32);
        schema.push("avg_airPres", LogicalType::Float);
        schema
    }

    fn projected() -> HavingOperand {
        HavingOperand::Projected(ProjectionKind::Aggregate(AggregateCall::new(
            AggregateFunction::Max,
            Some(1),
        )))
    }

    #[test]
    fn test_literal_on_left_flips() {
        let having = HavingExpr::Comparison {
            op: CompareOp::Lt,
            left: HavingOperand::Literal(Literal::Integer(20)),
            right: projected(),
        };
        let filter = HavingFilterBuilder::build(&having, 0, &schema()).unwrap();
        assert_eq!(filter.op, CompareOp::Gt);
        assert_eq!(filter.literal, Literal::Integer(20));
        assert_eq!(filter.storage_type, LogicalType::Int32);
    }

    #[test]
    fn test_decimal_against_integer_rejected() {
        let having = HavingExpr::Comparison {
            op: CompareOp::Gt,
            left: projected(),
            right: HavingOperand::Literal(Literal::Decimal(2.5)),
        };
        let err = HavingFilterBuilder::build(&having, 0, &schema()).unwrap_err();
        assert_eq!(err.code(), CompileErrorCode::TypeError);

        let filter = HavingFilterBuilder::build(&having, 1, &schema()).unwrap();
        assert_eq!(filter.storage_type, LogicalType::Float);
    }

    #[test]
    fn test_text_literal_rejected() {
        let having = HavingExpr::Comparison {
            op: CompareOp::Eq,
            left: projected(),
            right: HavingOperand::Literal(Literal::Text("hot".into())),
        };
        let err = HavingFilterBuilder::build(&having, 0, &schema()).unwrap_err();
        assert_eq!(err.code(), CompileErrorCode::TypeError);
    }

    #[test]
    fn test_non_literal_comparison_rejected() {
        let having = HavingExpr::Comparison {
            op: CompareOp::Eq,
            left: projected(),
            right: HavingOperand::Expression("airTemp + 1".into()),
        };
        let err = HavingFilterBuilder::build(&having, 0, &schema()).unwrap_err();
        assert_eq!(err.code(), CompileErrorCode::UnsupportedQueryShape);
    }
}
