//! CLI configuration, DDL loading and the shell loop

use std::fs;
use std::io::Cursor;

use embeddb_sql::cli::{prepare, run_shell, CatalogArgs, Config, OutputOptions};
use tempfile::TempDir;

// =============================================================================
// Config
// =============================================================================

#[test]
fn test_config_defaults_when_absent() {
    let (config, catalog) = prepare(&CatalogArgs::default()).unwrap();
    assert_eq!(config, Config::default());
    assert!(catalog.table_names().is_empty());
}

#[test]
fn test_config_and_flag_ddl_combined() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("schema.sql"),
        "CREATE TABLE uwa (id INT PRIMARY KEY, airTemp INT, airPres INT, windSpeed INT);",
    )
    .unwrap();
    let extra = dir.path().join("extra.sql");
    fs::write(&extra, "CREATE INDEX uTemp ON uwa (airTemp);").unwrap();
    let config_path = dir.path().join("embeddb.json");
    fs::write(
        &config_path,
        r#"{"ddl_files": ["schema.sql"], "log_level": "error", "emit_explain": true}"#,
    )
    .unwrap();

    let args = CatalogArgs {
        config: Some(config_path),
        ddl: vec![extra],
        log_level: None,
    };
    let (config, catalog) = prepare(&args).unwrap();
    assert!(config.emit_explain);
    assert_eq!(config.log_level, "error");
    assert_eq!(catalog.table("uwa").unwrap().indexes.len(), 1);
}

#[test]
fn test_bad_ddl_in_config_fails() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("embeddb.json");
    fs::write(&config_path, r#"{"ddl": ["DROP TABLE uwa"]}"#).unwrap();
    let args = CatalogArgs {
        config: Some(config_path),
        ..Default::default()
    };
    let err = prepare(&args).unwrap_err();
    assert_eq!(err.code_str(), "EMBEDDB_CLI_CATALOG_ERROR");
}

// =============================================================================
// Shell
// =============================================================================

#[test]
fn test_shell_session() {
    let mut catalog = embeddb_sql::catalog::Catalog::new();
    let script = "\
CREATE TABLE uwa (id INT PRIMARY KEY, airTemp INT);
CREATE INDEX uTemp
  ON uwa (airTemp);
SELECT min(airTemp) FROM uwa;
SELECT nothing FROM uwa;
exit
SELECT * FROM uwa;
";
    let mut out = Vec::new();
    let mut err = Vec::new();
    run_shell(
        &mut catalog,
        Cursor::new(script),
        &mut out,
        &mut err,
        OutputOptions::default(),
    )
    .unwrap();

    let out = String::from_utf8(out).unwrap();
    let err = String::from_utf8(err).unwrap();
    assert!(out.contains("Table uwa created."));
    assert!(out.contains("Index uTemp created on uwa."));
    assert_eq!(out.matches("embedDBOperator* createOperator(").count(), 1);
    assert!(out.contains("createMinAggregate(1, -4);"));
    assert_eq!(err.lines().count(), 1);
    assert!(err.starts_with("EMBEDDB_UNKNOWN_COLUMN: "));
}
