//! Helper routine registry
//!
//! Generated programs may need C helpers ahead of `createOperator`: scalar
//! math functions, the group comparison function and per-column compute
//! callbacks. Each is registered once by name; emission follows
//! registration order.

use serde::Serialize;

use crate::schema::LogicalType;

use super::arithmetic::{ArithmeticExpr, UnaryFunction};

/// How `groupFunction` decides whether two records share a group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GroupComparison {
    /// Aggregated without GROUP BY: one group
    Always,
    /// Compare the group expression on the previous and current record
    Expression {
        expr: ArithmeticExpr,
        column_type: LogicalType,
        offset: usize,
    },
}

/// One generated C helper
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum HelperRoutine {
    Math(UnaryFunction),
    GroupFunction(GroupComparison),
    /// Copies the group expression of the previous record into the output
    GroupCompute {
        name: String,
        expr: ArithmeticExpr,
        source_type: LogicalType,
        source_offset: usize,
        output_type: LogicalType,
    },
}

impl HelperRoutine {
    /// C function name, also the registry key
    pub fn name(&self) -> &str {
        match self {
            HelperRoutine::Math(function) => function.helper_name(),
            HelperRoutine::GroupFunction(_) => "groupFunction",
            HelperRoutine::GroupCompute { name, .. } => name,
        }
    }
}

/// Insertion-ordered set of helpers keyed by name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HelperSet {
    routines: Vec<HelperRoutine>,
}

impl HelperSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a routine unless one with the same name exists.
    /// Returns true if it was added.
    pub fn register(&mut self, routine: HelperRoutine) -> bool {
        if self.contains(routine.name()) {
            return false;
        }
        self.routines.push(routine);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.routines.iter().any(|r| r.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HelperRoutine> {
        self.routines.iter()
    }

    pub fn len(&self) -> usize {
        self.routines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }
}
