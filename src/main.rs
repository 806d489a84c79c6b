//! embeddb-sql binary
//!
//! Argument parsing and command dispatch live in `cli`; a failed command
//! prints its error on stderr and exits with status 1.

use embeddb_sql::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
