//! Emitted program shape
//!
//! Checks the exact text of a filtered scan and the structure of grouped
//! programs: helper order, descriptor construction, teardown.

use embeddb_sql::catalog::Catalog;
use embeddb_sql::compile;

fn catalog() -> Catalog {
    Catalog::with_ddl([
        "CREATE TABLE uwa (id INT PRIMARY KEY, airTemp INT, airPres INT, windSpeed INT)",
        "CREATE INDEX uTemp ON uwa (airTemp)",
    ])
    .unwrap()
}

// =============================================================================
// Full text
// =============================================================================

const FILTERED_SCAN: &str = r#"embedDBOperator* createOperator(embedDBState* state, void*** allocatedValues) {
    uint32_t* minKey = (uint32_t*)malloc(sizeof(uint32_t));
    *minKey = 100;
    int32_t* minData = (int32_t*)malloc(sizeof(int32_t));
    *minData = 21;
    embedDBIterator* it = (embedDBIterator*)malloc(sizeof(embedDBIterator));
    it->minKey = minKey;
    it->maxKey = NULL;
    it->minData = minData;
    it->maxData = NULL;
    embedDBInitIterator(state, it);

    uint8_t numCols = 4;
    int8_t colSizes[] = {4, 4, 4, 4};
    int8_t colSignedness[] = {embedDB_COLUMN_UNSIGNED, embedDB_COLUMN_SIGNED, embedDB_COLUMN_SIGNED, embedDB_COLUMN_SIGNED};
    embedDBSchema* schema = embedDBCreateSchema(numCols, colSizes, colSignedness);
    embedDBOperator* scanOp = createTableScanOperator(state, it, schema);
    int32_t* selValNEQwindSpeed = (int32_t*)malloc(sizeof(int32_t));
    *selValNEQwindSpeed = 3;
    embedDBOperator* selectNEQwindSpeed = createSelectionOperator(scanOp, 3, SELECT_NEQ, selValNEQwindSpeed);
    selectNEQwindSpeed->init(selectNEQwindSpeed);

    embedDBFreeSchema(&schema);

    *allocatedValues = (void**)malloc(4 * sizeof(void*));
    ((void**)*allocatedValues)[0] = minKey;
    ((void**)*allocatedValues)[1] = minData;
    ((void**)*allocatedValues)[2] = it;
    ((void**)*allocatedValues)[3] = selValNEQwindSpeed;

    return selectNEQwindSpeed;
}

void execOperator(embedDBState* state) {
    void** allocatedValues;
    embedDBOperator* op = createOperator(state, &allocatedValues);
    void* recordBuffer = op->recordBuffer;
    uint32_t* id = (uint32_t*)((int8_t*)recordBuffer + 0);
    int32_t* airTemp = (int32_t*)((int8_t*)recordBuffer + 4);

    // Print as csv
    while (exec(op)) {
        printf("%d,%d\n", *id, *airTemp);
    }
    printf("\n");

    op->close(op);
    embedDBFreeOperatorRecursive(&op);
    recordBuffer = NULL;
    for (int i = 0; i < 4; i++) {
        free(allocatedValues[i]);
    }
    free(allocatedValues);
}
"#;

#[test]
fn test_filtered_scan_full_text() {
    let text = compile(
        &catalog(),
        "SELECT id, airTemp FROM uwa WHERE id >= 100 AND airTemp > 20 AND windSpeed != 3",
    )
    .unwrap();
    assert_eq!(text, FILTERED_SCAN);
}

// =============================================================================
// Grouped programs
// =============================================================================

#[test]
fn test_daily_summary_program() {
    let text = compile(
        &catalog(),
        "SELECT floor(id / 86400) AS day, min(airTemp), max(airTemp), avg(airTemp) \
         FROM uwa GROUP BY floor(id / 86400)",
    )
    .unwrap();

    let floor = text.find("int embedDBFloor(double x) {").unwrap();
    let group = text.find("int8_t groupFunction(const void* lastRecord, const void* record) {").unwrap();
    let custom = text.find("void customAggregateFunc0(").unwrap();
    let create = text.find("embedDBOperator* createOperator(").unwrap();
    assert!(floor < group && group < custom && custom < create);

    assert!(text.contains("    return embedDBFloor((lastValue / 86400)) == embedDBFloor((value / 86400));\n"));
    assert!(text.contains("    group0->compute = customAggregateFunc0;\n    group0->colSize = 4;\n"));
    assert!(text.contains("    embedDBAggregateFunc* min1 = createMinAggregate(1, -4);\n"));
    assert!(text.contains("    embedDBAggregateFunc* max2 = createMaxAggregate(1, -4);\n"));
    assert!(text.contains("    embedDBAggregateFunc* avg3 = createAvgAggregate(1, 4);\n"));
    assert!(text.contains(
        "    aggFuncs[3] = *avg3;\n    free(group0);\n    free(min1);\n    free(max2);\n    free(avg3);\n"
    ));
    assert!(text.contains("    embedDBOperator* aggOp = createAggregateOperator(scanOp, groupFunction, aggFuncs, 4);\n"));
    assert!(text.contains("    float* avg_airTemp = (float*)((int8_t*)recordBuffer + 12);\n"));
    assert!(text.contains("        printf(\"%d,%d,%d,%f\\n\", *day, *min_airTemp, *max_airTemp, *avg_airTemp);\n"));
}

#[test]
fn test_helpers_separated_by_blank_lines() {
    let text = compile(&catalog(), "SELECT count(*) FROM uwa").unwrap();
    assert!(text.starts_with(
        "int8_t groupFunction(const void* lastRecord, const void* record) {\n    return 1;\n}\n\nembedDBOperator* createOperator("
    ));
}

#[test]
fn test_sum_and_count_descriptors() {
    let text = compile(&catalog(), "SELECT sum(windSpeed), count(*) FROM uwa").unwrap();
    assert!(text.contains("    embedDBAggregateFunc* sum0 = createSumAggregate(3);\n"));
    assert!(text.contains("    embedDBAggregateFunc* counter1 = createCountAggregate();\n"));
    assert!(text.contains("    int64_t* sum_windSpeed = (int64_t*)((int8_t*)recordBuffer + 0);\n"));
    assert!(text.contains("    uint32_t* count = (uint32_t*)((int8_t*)recordBuffer + 8);\n"));
}

#[test]
fn test_having_selection_and_teardown() {
    let text = compile(
        &catalog(),
        "SELECT airTemp, max(airPres) FROM uwa GROUP BY airTemp HAVING max(airPres) > 900",
    )
    .unwrap();
    assert!(text.contains("    int32_t* havingValue = (int32_t*)malloc(sizeof(int32_t));\n    *havingValue = 900;\n"));
    assert!(text.contains("    embedDBOperator* havingOp = createSelectionOperator(aggOp, 1, SELECT_GT, havingValue);\n"));
    assert!(text.contains("    return havingOp;\n"));
    assert!(text.contains("    *allocatedValues = (void**)malloc(3 * sizeof(void*));\n"));
    assert!(text.contains("    for (int i = 0; i < 3; i++) {\n"));
}

// =============================================================================
// Non-grouped arithmetic
// =============================================================================

#[test]
fn test_scan_arithmetic_projection() {
    let text = compile(&catalog(), "SELECT id, airTemp * 1.8 + 32 AS fahrenheit FROM uwa").unwrap();
    assert!(text.contains("    int32_t* fahrenheit = (int32_t*)((int8_t*)recordBuffer + 4);\n"));
    assert!(text.contains("        printf(\"%d,%f\\n\", *id, (double)(((*fahrenheit * 1.8) + 32)));\n"));
}

#[test]
fn test_scan_function_registers_helper() {
    let text = compile(&catalog(), "SELECT abs(airTemp) AS magnitude FROM uwa").unwrap();
    assert!(text.starts_with("double embedDBAbs(double x) {\n"));
    assert!(text.contains("(int32_t)(embedDBAbs(*magnitude))"));
}

#[test]
fn test_bigint_literal_emitted_exactly() {
    let catalog = Catalog::with_ddl(["CREATE TABLE readings (ts BIGINT PRIMARY KEY, energy BIGINT)"]).unwrap();
    let text = compile(&catalog, "SELECT energy + 9007199254740993 AS shifted FROM readings").unwrap();
    assert!(text.contains("+ 9007199254740993)"));
    assert!(!text.contains("9007199254740992"));
}
