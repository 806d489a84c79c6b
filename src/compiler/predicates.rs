//! Predicate classification
//!
//! Splits the WHERE conjuncts into index bounds and runtime filters:
//! - comparisons on the primary key bound the key side of the iterator
//! - comparisons on one secondary-indexed column bound the data side
//! - everything else, and every `!=`, becomes a selection operator
//!
//! Bounds are inclusive. Strict comparisons are normalized by one:
//! `a > 5` is `min = 6`, `a < 5` is `max = 4`.
//!
//! The key is unsigned. A negative lower key bound is raised to 0; a negative
//! upper key bound can match no record and is a type error.

use serde::Serialize;

use crate::catalog::IndexHint;
use crate::frontend::{AnalyzedQuery, CompareOp, Literal};
use crate::observability::{log_event_with_fields, Event};

use super::errors::{CompileError, CompileResult};

/// Inclusive bound pair for one side of the iterator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexBound {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl IndexBound {
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Runtime filter `column OP value`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilterPredicate {
    pub column: usize,
    pub op: CompareOp,
    pub value: i64,
}

/// Output of classification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassifiedPredicates {
    /// Primary key column, if any comparison bounds it
    pub key_column: Option<usize>,
    pub key: IndexBound,
    /// Secondary column that bounds the data side
    pub secondary_column: Option<usize>,
    pub secondary: IndexBound,
    /// Selection operators, in application order
    pub filters: Vec<FilterPredicate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Min,
    Max,
}

/// Stateless classifier
pub struct PredicateClassifier;

impl PredicateClassifier {
    /// Classify the WHERE conjuncts of a single-table query
    pub fn classify(query: &AnalyzedQuery) -> CompileResult<ClassifiedPredicates> {
        if query.tables.len() != 1 {
            return Err(CompileError::unsupported_shape(format!(
                "queries over {} tables are not supported",
                query.tables.len()
            )));
        }
        if query.outer_join {
            return Err(CompileError::unsupported_shape(
                "left and right joins are not supported",
            ));
        }

        let mut candidates = Vec::new();
        let mut filters = Vec::new();
        for comparison in &query.predicates {
            let value = integer_value(&comparison.literal)?;
            let hint = query
                .index_hints
                .get(comparison.column)
                .copied()
                .unwrap_or(IndexHint::None);
            let predicate = FilterPredicate {
                column: comparison.column,
                op: comparison.op,
                value,
            };
            if hint.is_indexed() {
                candidates.push((hint, predicate));
            } else {
                filters.push(predicate);
            }
        }

        candidates.sort_by_key(|(_, p)| p.column);

        let secondary_column = candidates
            .iter()
            .find(|(hint, p)| matches!(hint, IndexHint::Secondary(_)) && p.op != CompareOp::NotEq)
            .map(|(_, p)| p.column);

        let mut result = ClassifiedPredicates {
            secondary_column,
            ..Default::default()
        };

        for (hint, predicate) in candidates {
            let is_key = hint == IndexHint::PrimaryKey;
            if !is_key && Some(predicate.column) != secondary_column {
                demote(&predicate);
                filters.push(predicate);
                continue;
            }

            let v = predicate.value;
            let (mut min, max) = match predicate.op {
                CompareOp::GtEq => (Some(v), None),
                CompareOp::Gt => (Some(v.checked_add(1).ok_or_else(|| overflow(&predicate))?), None),
                CompareOp::LtEq => (None, Some(v)),
                CompareOp::Lt => (None, Some(v.checked_sub(1).ok_or_else(|| overflow(&predicate))?)),
                CompareOp::Eq => (Some(v), Some(v)),
                CompareOp::NotEq => {
                    demote(&predicate);
                    filters.push(predicate);
                    continue;
                }
            };

            if is_key {
                if max.is_some_and(|m| m < 0) {
                    return Err(negative_key(&predicate));
                }
                min = min.map(|m| m.max(0));
            }

            let bound = if is_key {
                result.key_column = Some(predicate.column);
                &mut result.key
            } else {
                &mut result.secondary
            };
            if let Some(value) = min {
                set_bound(bound, Side::Min, value, &predicate, is_key);
            }
            if let Some(value) = max {
                set_bound(bound, Side::Max, value, &predicate, is_key);
            }
        }

        let mut deduped: Vec<FilterPredicate> = Vec::with_capacity(filters.len());
        for filter in filters {
            if !deduped.contains(&filter) {
                deduped.push(filter);
            }
        }
        result.filters = deduped;

        Ok(result)
    }
}

fn integer_value(literal: &Literal) -> CompileResult<i64> {
    literal.as_integer().ok_or_else(|| {
        CompileError::type_error(format!(
            "value {} in comparison must be an INT or BIGINT literal",
            literal
        ))
    })
}

fn overflow(predicate: &FilterPredicate) -> CompileError {
    CompileError::type_error(format!(
        "bound {} {} cannot be made inclusive without overflow",
        predicate.op, predicate.value
    ))
}

fn negative_key(predicate: &FilterPredicate) -> CompileError {
    CompileError::type_error(format!(
        "key bound {} {} is below zero; the key column is unsigned",
        predicate.op, predicate.value
    ))
}

fn demote(predicate: &FilterPredicate) {
    log_event_with_fields(
        Event::FilterDemoted,
        &[
            ("column", &predicate.column.to_string()),
            ("op", predicate.op.symbol()),
            ("value", &predicate.value.to_string()),
        ],
    );
}

/// Later bounds on the same side replace earlier ones.
fn set_bound(bound: &mut IndexBound, side: Side, value: i64, predicate: &FilterPredicate, is_key: bool) {
    let slot = match side {
        Side::Min => &mut bound.min,
        Side::Max => &mut bound.max,
    };
    if let Some(previous) = *slot {
        if previous != value {
            log_event_with_fields(
                Event::BoundOverwritten,
                &[
                    ("column", &predicate.column.to_string()),
                    ("index", if is_key { "key" } else { "data" }),
                    ("side", if side == Side::Min { "min" } else { "max" }),
                    ("previous", &previous.to_string()),
                    ("value", &value.to_string()),
                ],
            );
        }
    }
    *slot = Some(value);
}
