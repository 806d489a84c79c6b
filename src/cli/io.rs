//! Interactive shell I/O
//!
//! Statements end with `;` and may span lines. `exit` quits. SELECT
//! statements are compiled and the program is written to `out`; anything
//! else is applied to the catalog as DDL. Errors go to `err` and the loop
//! continues.

use std::io::{BufRead, Write};

use crate::catalog::{Catalog, DdlOutcome};
use crate::compiler::{ExplainPlan, QueryCompiler};

use super::errors::CliResult;

pub const BANNER: &str = "embeddb-sql shell. Statements end with ';'. Type 'exit' to quit.";
pub const PROMPT: &str = ">>> ";
pub const CONTINUATION_PROMPT: &str = "... ";

/// Options for compiled output
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub emit_explain: bool,
}

/// Read-eval loop over any line source
pub fn run_shell<R, W, E>(
    catalog: &mut Catalog,
    input: R,
    out: &mut W,
    err: &mut E,
    options: OutputOptions,
) -> CliResult<()>
where
    R: BufRead,
    W: Write,
    E: Write,
{
    writeln!(out, "{}", BANNER)?;

    let mut buffer = String::new();
    let mut lines = input.lines();
    loop {
        write!(out, "{}", if buffer.is_empty() { PROMPT } else { CONTINUATION_PROMPT })?;
        out.flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        let trimmed = line.trim();

        if buffer.is_empty() {
            if trimmed.is_empty() {
                continue;
            }
            if is_exit(trimmed) {
                break;
            }
        }

        buffer.push_str(&line);
        buffer.push('\n');

        if trimmed.ends_with(';') {
            let statement = std::mem::take(&mut buffer);
            execute_statement(catalog, statement.trim(), out, err, options)?;
        }
    }

    writeln!(out)?;
    Ok(())
}

fn is_exit(line: &str) -> bool {
    let word = line.trim_end_matches(';').trim();
    word.eq_ignore_ascii_case("exit") || word.eq_ignore_ascii_case("quit")
}

/// True if the statement should be compiled rather than applied as DDL
pub fn is_query(statement: &str) -> bool {
    statement
        .split_whitespace()
        .next()
        .map(|word| word.eq_ignore_ascii_case("select") || word.eq_ignore_ascii_case("with"))
        .unwrap_or(false)
}

/// Run one `;`-terminated statement
pub fn execute_statement<W: Write, E: Write>(
    catalog: &mut Catalog,
    statement: &str,
    out: &mut W,
    err: &mut E,
    options: OutputOptions,
) -> CliResult<()> {
    if is_query(statement) {
        match compile_statement(catalog, statement, options) {
            Ok(text) => write!(out, "{}", text)?,
            Err(message) => writeln!(err, "{}", message)?,
        }
        return Ok(());
    }

    match catalog.execute_ddl(statement) {
        Ok(outcomes) => {
            for outcome in outcomes {
                let message = match outcome {
                    DdlOutcome::TableCreated(table) => format!("Table {} created.", table),
                    DdlOutcome::IndexCreated { index, table } => {
                        format!("Index {} created on {}.", index, table)
                    }
                    DdlOutcome::Skipped(name) => format!("{} already exists, skipped.", name),
                };
                writeln!(out, "{}", message)?;
            }
        }
        Err(e) => writeln!(err, "{}: {}", e.code(), e)?,
    }
    Ok(())
}

/// Program text, optionally prefixed with the explain plan
pub fn compile_statement(
    catalog: &Catalog,
    statement: &str,
    options: OutputOptions,
) -> Result<String, crate::compiler::CompileError> {
    let compiler = QueryCompiler::new(catalog);
    let text = compiler.compile(statement)?;
    if !options.emit_explain {
        return Ok(text);
    }
    let program = compiler.plan_sql(statement)?;
    Ok(format!("/*\n{}*/\n{}", ExplainPlan::from_program(&program), text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run(script: &str) -> (Catalog, String, String) {
        let mut catalog = Catalog::new();
        let mut out = Vec::new();
        let mut err = Vec::new();
        run_shell(
            &mut catalog,
            Cursor::new(script.to_string()),
            &mut out,
            &mut err,
            OutputOptions::default(),
        )
        .unwrap();
        (
            catalog,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_multiline_statements() {
        let (catalog, out, err) = run(
            "CREATE TABLE uwa (id INT PRIMARY KEY,\n  airTemp INT);\nSELECT airTemp\nFROM uwa\nWHERE id > 5;\nexit\n",
        );
        assert!(catalog.table("uwa").is_some());
        assert!(out.starts_with(BANNER));
        assert!(out.contains("Table uwa created."));
        assert!(out.contains(CONTINUATION_PROMPT));
        assert!(out.contains("embedDBOperator* createOperator(embedDBState* state, void*** allocatedValues) {"));
        assert!(err.is_empty());
    }

    #[test]
    fn test_errors_do_not_stop_the_loop() {
        let (catalog, out, err) = run(
            "SELECT * FROM missing;\nCREATE TABLE t (id INT PRIMARY KEY);\nSELECT * FROM t WHERE id = 1 OR id = 2;\n",
        );
        assert!(catalog.table("t").is_some());
        assert!(out.contains("Table t created."));
        assert!(err.contains("EMBEDDB_UNKNOWN_TABLE"));
        assert!(err.contains("EMBEDDB_UNSUPPORTED_QUERY_SHAPE"));
    }

    #[test]
    fn test_exit_stops_reading() {
        let (catalog, _, _) = run("exit\nCREATE TABLE t (id INT PRIMARY KEY);\n");
        assert!(catalog.table("t").is_none());
    }

    #[test]
    fn test_is_query() {
        assert!(is_query("select * from t;"));
        assert!(is_query("  SELECT 1"));
        assert!(!is_query("CREATE TABLE t (id INT)"));
        assert!(!is_query(""));
    }

    #[test]
    fn test_emit_explain_prefix() {
        let catalog = Catalog::with_ddl(["CREATE TABLE t (id INT PRIMARY KEY, v INT)"]).unwrap();
        let text = compile_statement(
            &catalog,
            "SELECT v FROM t",
            OutputOptions { emit_explain: true },
        )
        .unwrap();
        assert!(text.starts_with("/*\n=== EXPLAIN PLAN ===\n"));
        assert!(text.contains("*/\nembedDBOperator* createOperator"));
    }
}
