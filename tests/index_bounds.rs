//! Index bound classification through the full compile path

use embeddb_sql::catalog::Catalog;
use embeddb_sql::compiler::{FilterPredicate, IndexBound, QueryCompiler};
use embeddb_sql::frontend::CompareOp;
use embeddb_sql::{compile, CompileErrorCode};

fn catalog() -> Catalog {
    Catalog::with_ddl([
        "CREATE TABLE uwa (id INT PRIMARY KEY, airTemp INT, airPres INT, windSpeed INT)",
        "CREATE INDEX uTemp ON uwa (airTemp)",
    ])
    .unwrap()
}

fn key_bound(condition: &str) -> IndexBound {
    let catalog = catalog();
    let sql = format!("SELECT * FROM uwa WHERE {}", condition);
    QueryCompiler::new(&catalog).plan_sql(&sql).unwrap().predicates.key
}

// =============================================================================
// Normalization
// =============================================================================

#[test]
fn test_inclusive_normalization() {
    assert_eq!(key_bound("id >= 10"), IndexBound { min: Some(10), max: None });
    assert_eq!(key_bound("id > 10"), IndexBound { min: Some(11), max: None });
    assert_eq!(key_bound("id <= 10"), IndexBound { min: None, max: Some(10) });
    assert_eq!(key_bound("id < 10"), IndexBound { min: None, max: Some(9) });
    assert_eq!(key_bound("id = 10"), IndexBound { min: Some(10), max: Some(10) });
}

#[test]
fn test_literal_on_left_is_flipped() {
    assert_eq!(key_bound("10 < id"), IndexBound { min: Some(11), max: None });
    assert_eq!(key_bound("10 >= id"), IndexBound { min: None, max: Some(10) });
}

#[test]
fn test_range_on_both_sides() {
    let text = compile(&catalog(), "SELECT * FROM uwa WHERE id > 5 AND id < 50").unwrap();
    assert!(text.contains("    *minKey = 6;\n"));
    assert!(text.contains("    *maxKey = 49;\n"));
    assert!(text.contains("    it->minKey = minKey;\n    it->maxKey = maxKey;\n"));
}

// =============================================================================
// Unbounded and demoted
// =============================================================================

#[test]
fn test_no_where_has_null_bounds() {
    let text = compile(&catalog(), "SELECT * FROM uwa").unwrap();
    assert!(text.contains(
        "    it->minKey = NULL;\n    it->maxKey = NULL;\n    it->minData = NULL;\n    it->maxData = NULL;\n"
    ));
    assert!(!text.contains("createSelectionOperator"));
}

#[test]
fn test_not_equal_on_indexed_column_is_filter() {
    let catalog = catalog();
    let program = QueryCompiler::new(&catalog)
        .plan_sql("SELECT * FROM uwa WHERE airTemp != 5")
        .unwrap();
    assert!(program.predicates.secondary.is_unbounded());
    assert_eq!(
        program.predicates.filters,
        vec![FilterPredicate { column: 1, op: CompareOp::NotEq, value: 5 }]
    );

    let text = compile(&catalog, "SELECT * FROM uwa WHERE airTemp != 5").unwrap();
    assert!(text.contains("    it->minData = NULL;\n"));
    assert!(text.contains("createSelectionOperator(scanOp, 1, SELECT_NEQ, selValNEQairTemp);"));
}

#[test]
fn test_secondary_bounds_data_side() {
    let catalog = catalog();
    let program = QueryCompiler::new(&catalog)
        .plan_sql("SELECT * FROM uwa WHERE airTemp >= 20 AND airTemp <= 30")
        .unwrap();
    assert_eq!(program.predicates.secondary_column, Some(1));
    assert_eq!(program.predicates.secondary, IndexBound { min: Some(20), max: Some(30) });
    assert!(program.predicates.key.is_unbounded());
}

#[test]
fn test_unindexed_selections_chain() {
    let text = compile(
        &catalog(),
        "SELECT * FROM uwa WHERE airPres > 1000 AND windSpeed <= 12",
    )
    .unwrap();
    assert!(text.contains("selectGTairPres = createSelectionOperator(scanOp, 2, SELECT_GT, selValGTairPres);"));
    assert!(text.contains("selectLTEwindSpeed = createSelectionOperator(selectGTairPres, 3, SELECT_LTE, selValLTEwindSpeed);"));
    assert!(text.contains("    return selectLTEwindSpeed;\n"));
}

// =============================================================================
// Collisions and rejections
// =============================================================================

#[test]
fn test_same_side_collision_later_wins() {
    assert_eq!(key_bound("id >= 5 AND id > 20"), IndexBound { min: Some(21), max: None });
    assert_eq!(key_bound("id > 20 AND id >= 5"), IndexBound { min: Some(5), max: None });
}

#[test]
fn test_non_integer_comparison_rejected() {
    let err = compile(&catalog(), "SELECT * FROM uwa WHERE id > 2.5").unwrap_err();
    assert_eq!(err.code(), CompileErrorCode::TypeError);

    let err = compile(&catalog(), "SELECT * FROM uwa WHERE airPres = 'high'").unwrap_err();
    assert_eq!(err.code(), CompileErrorCode::TypeError);
}

#[test]
fn test_negative_key_bounds() {
    assert_eq!(key_bound("id > -5"), IndexBound { min: Some(0), max: None });
    let text = compile(&catalog(), "SELECT * FROM uwa WHERE id >= -10").unwrap();
    assert!(text.contains("    *minKey = 0;\n"));

    for condition in ["id < 0", "id <= -1", "id = -7"] {
        let sql = format!("SELECT * FROM uwa WHERE {}", condition);
        let err = compile(&catalog(), &sql).unwrap_err();
        assert_eq!(err.code(), CompileErrorCode::TypeError, "{}", condition);
    }
}

#[test]
fn test_bigint_key_bound_type() {
    let catalog = Catalog::with_ddl(["CREATE TABLE readings (ts BIGINT PRIMARY KEY, v INT)"]).unwrap();
    let text = compile(&catalog, "SELECT * FROM readings WHERE ts >= 1700000000000").unwrap();
    assert!(text.contains("    uint64_t* minKey = (uint64_t*)malloc(sizeof(uint64_t));\n    *minKey = 1700000000000;\n"));
    assert!(text.contains("    int8_t colSizes[] = {8, 4};\n"));
}
