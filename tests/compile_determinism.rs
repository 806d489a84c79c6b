//! Determinism: identical input gives byte-identical output, regardless of
//! log level or of compiles in between.

use embeddb_sql::catalog::Catalog;
use embeddb_sql::compiler::{ExplainPlan, QueryCompiler};
use embeddb_sql::observability::{Logger, Severity};
use embeddb_sql::compile;

const QUERIES: &[&str] = &[
    "SELECT * FROM uwa",
    "SELECT id, airTemp FROM uwa WHERE id >= 100 AND airTemp > 20 AND windSpeed != 3",
    "SELECT floor(id / 86400) AS day, min(airTemp), max(airTemp), avg(airTemp) FROM uwa GROUP BY day",
    "SELECT airTemp, count(*) FROM uwa GROUP BY airTemp HAVING count(*) > 2",
    "SELECT round(airPres / 10) AS p, sum(windSpeed) FROM uwa WHERE id < 5000 GROUP BY p",
];

fn catalog() -> Catalog {
    Catalog::with_ddl([
        "CREATE TABLE uwa (id INT PRIMARY KEY, airTemp INT, airPres INT, windSpeed INT)",
        "CREATE INDEX uTemp ON uwa (airTemp)",
    ])
    .unwrap()
}

#[test]
fn test_same_input_same_output() {
    let catalog = catalog();
    for sql in QUERIES {
        let first = compile(&catalog, sql).unwrap();
        let second = compile(&catalog, sql).unwrap();
        assert_eq!(first, second, "{}", sql);
    }
}

#[test]
fn test_independent_catalogs_agree() {
    for sql in QUERIES {
        assert_eq!(compile(&catalog(), sql).unwrap(), compile(&catalog(), sql).unwrap());
    }
}

#[test]
fn test_interleaved_compiles_do_not_leak_state() {
    let catalog = catalog();
    let alone = compile(&catalog, QUERIES[1]).unwrap();
    for sql in QUERIES {
        compile(&catalog, sql).unwrap();
    }
    assert_eq!(compile(&catalog, QUERIES[1]).unwrap(), alone);
}

#[test]
fn test_log_level_does_not_change_output() {
    let catalog = catalog();
    let before = Logger::min_severity();

    Logger::set_min_severity(Severity::Error);
    let quiet: Vec<String> = QUERIES.iter().map(|q| compile(&catalog, q).unwrap()).collect();
    Logger::set_min_severity(Severity::Trace);
    let verbose: Vec<String> = QUERIES.iter().map(|q| compile(&catalog, q).unwrap()).collect();

    Logger::set_min_severity(before);
    assert_eq!(quiet, verbose);
}

#[test]
fn test_explain_is_deterministic() {
    let catalog = catalog();
    let compiler = QueryCompiler::new(&catalog);
    for sql in QUERIES {
        let a = ExplainPlan::from_program(&compiler.plan_sql(sql).unwrap());
        let b = ExplainPlan::from_program(&compiler.plan_sql(sql).unwrap());
        assert_eq!(a.to_string(), b.to_string());
        assert_eq!(a.to_json(), b.to_json());
    }
}
