//! Catalog subsystem
//!
//! Holds table, column and index definitions populated from DDL. The
//! compiler only reads it; a compile call borrows the catalog immutably for
//! its whole duration.

#[allow(clippy::module_inception)]
mod catalog;
mod errors;
mod types;

pub use catalog::{Catalog, DdlOutcome};
pub(crate) use catalog::object_name;
pub use errors::{CatalogError, CatalogResult};
pub use types::{ColumnDef, DeclaredType, IndexDef, IndexHint, TableDef};
