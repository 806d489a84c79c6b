//! Record layout subsystem
//!
//! Every record handled by the generated pipeline is a packed sequence of
//! fixed-width columns. Two layouts exist per compile: the table layout the
//! scan produces, and the output layout derived from the projection list.
//! They may diverge (an AVG column is float in the output and absent from
//! the table).

mod resolver;
mod types;

pub use resolver::SchemaResolver;
pub use types::{Column, LogicalType, Schema};
