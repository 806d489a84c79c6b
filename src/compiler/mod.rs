//! Query compiler subsystem
//!
//! Translates one analyzed single-table SELECT into C source for the
//! EmbedDB operator API.
//!
//! # Pipeline
//!
//! 1. Predicate classification: index bounds vs. runtime selections
//! 2. Schema resolution: table and output record layouts
//! 3. Aggregate planning and the HAVING filter (grouped queries only)
//! 4. Operator tree assembly into an `OperatorProgram`
//! 5. Code emission: helpers, `createOperator`, `execOperator`
//!
//! Planning never emits and emission never plans; the same input always
//! yields byte-identical output.

mod aggregate;
mod arithmetic;
#[allow(clippy::module_inception)]
mod compiler;
mod emitter;
mod errors;
mod explain;
mod having;
mod helpers;
mod predicates;
mod program;

pub use aggregate::{AggregateDescriptor, AggregateKind, AggregatePlan, AggregatePlanner};
pub use arithmetic::{ArithmeticExpr, ArithmeticTranslator, BinaryOperator, UnaryFunction};
pub use compiler::{compile, QueryCompiler};
pub use emitter::CodeEmitter;
pub use errors::{CompileError, CompileErrorCode, CompileResult};
pub use explain::ExplainPlan;
pub use having::{HavingFilter, HavingFilterBuilder};
pub use helpers::{GroupComparison, HelperRoutine, HelperSet};
pub use predicates::{ClassifiedPredicates, FilterPredicate, IndexBound, PredicateClassifier};
pub use program::{NameAllocator, OperatorProgram, OperatorTreeAssembler, OutputColumn, ProgramParts, Step};
