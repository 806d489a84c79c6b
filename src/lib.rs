//! embeddb-sql - compiles single-table SQL SELECT statements into EmbedDB
//! operator pipelines
//!
//! ```ignore
//! use embeddb_sql::catalog::Catalog;
//!
//! let catalog = Catalog::with_ddl([
//!     "CREATE TABLE uwa (id INT PRIMARY KEY, airTemp INT, airPres INT, windSpeed INT)",
//!     "CREATE INDEX uTemp ON uwa (airTemp)",
//! ])?;
//! let program = embeddb_sql::compile(&catalog, "SELECT * FROM uwa WHERE airTemp >= 20")?;
//! ```

pub mod catalog;
pub mod cli;
pub mod compiler;
pub mod frontend;
pub mod observability;
pub mod schema;

pub use compiler::{compile, CompileError, CompileErrorCode, CompileResult, QueryCompiler};
