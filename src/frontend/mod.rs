//! SQL front end
//!
//! Turns SQL text into an `AnalyzedQuery`: an explicit, name-resolved
//! description of one single-table SELECT. Parse failures, unknown tables
//! and unknown columns are reported here; shape and type checks that depend
//! on the record layout are left to the compiler.

mod analyzer;
mod ast;

pub use analyzer::analyze;
pub use ast::{
    AggregateCall, AggregateFunction, AnalyzedQuery, ArithmeticOperator, CompareOp, Comparison,
    HavingExpr, HavingOperand, Literal, Projection, ProjectionKind, ScalarExpr,
};
