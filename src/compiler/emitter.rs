//! C code emission
//!
//! Renders an `OperatorProgram` as three parts, in order:
//! 1. helper routines, once each, in registration order
//! 2. `createOperator`, which builds the pipeline
//! 3. `execOperator`, which runs it and prints CSV
//!
//! Emission is a pure function of the program.

use crate::frontend::Literal;
use crate::schema::{LogicalType, Schema};

use super::aggregate::{AggregateDescriptor, AggregateKind};
use super::errors::{CompileError, CompileResult};
use super::helpers::{GroupComparison, HelperRoutine};
use super::program::{OperatorProgram, Step};
use super::arithmetic::UnaryFunction;

const INDENT: &str = "    ";

/// Appends indented lines to a buffer
struct CodeWriter {
    buf: String,
    depth: usize,
}

impl CodeWriter {
    fn new() -> Self {
        Self {
            buf: String::new(),
            depth: 0,
        }
    }

    fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.depth {
            self.buf.push_str(INDENT);
        }
        self.buf.push_str(text.as_ref());
        self.buf.push('\n');
    }

    fn blank(&mut self) {
        self.buf.push('\n');
    }

    fn open(&mut self, text: impl AsRef<str>) {
        self.line(text);
        self.depth += 1;
    }

    fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.line("}");
    }

    fn finish(self) -> String {
        self.buf
    }
}

/// Stateless renderer
pub struct CodeEmitter;

impl CodeEmitter {
    /// Full program text
    pub fn emit(program: &OperatorProgram) -> CompileResult<String> {
        if program.output.is_empty() {
            return Err(CompileError::internal("query has no printable columns"));
        }

        let mut out = String::new();
        let helpers: Vec<String> = program.helpers.iter().map(Self::helper).collect();
        if !helpers.is_empty() {
            out.push_str(&helpers.join("\n"));
            out.push('\n');
        }
        out.push_str(&Self::create_operator(program)?);
        out.push('\n');
        out.push_str(&Self::exec_operator(program));
        Ok(out)
    }

    /// Definition of one helper routine
    pub fn helper(routine: &HelperRoutine) -> String {
        let mut w = CodeWriter::new();
        match routine {
            HelperRoutine::Math(function) => math_helper(&mut w, *function),
            HelperRoutine::GroupFunction(comparison) => {
                w.open("int8_t groupFunction(const void* lastRecord, const void* record) {");
                match comparison {
                    GroupComparison::Always => w.line("return 1;"),
                    GroupComparison::Expression {
                        expr,
                        column_type,
                        offset,
                    } => {
                        let t = column_type.c_type();
                        w.line(format!(
                            "{} lastValue = *(({}*)((int8_t*)lastRecord + {}));",
                            t, t, offset
                        ));
                        w.line(format!("{} value = *(({}*)((int8_t*)record + {}));", t, t, offset));
                        w.line(format!(
                            "return {} == {};",
                            expr.format_with("lastValue"),
                            expr.format_with("value")
                        ));
                    }
                }
                w.close();
            }
            HelperRoutine::GroupCompute {
                name,
                expr,
                source_type,
                source_offset,
                output_type,
            } => {
                let src = source_type.c_type();
                let out = output_type.c_type();
                w.open(format!(
                    "void {}(embedDBAggregateFunc* aggFunc, embedDBSchema* schema, void* recordBuffer, const void* lastRecord) {{",
                    name
                ));
                w.line(format!(
                    "{} lastValue = *(({}*)((int8_t*)lastRecord + {}));",
                    src, src, source_offset
                ));
                w.line(format!("{} calculatedValue = {};", out, expr.format_with("lastValue")));
                w.line(format!(
                    "memcpy((int8_t*)recordBuffer + getColOffsetFromSchema(schema, aggFunc->colNum), &calculatedValue, sizeof({}));",
                    out
                ));
                w.close();
            }
        }
        w.finish()
    }

    fn create_operator(program: &OperatorProgram) -> CompileResult<String> {
        let mut w = CodeWriter::new();
        w.open("embedDBOperator* createOperator(embedDBState* state, void*** allocatedValues) {");

        for step in &program.steps {
            match step {
                Step::AllocateLiteral {
                    variable,
                    storage_type,
                    value,
                } => allocate_literal(&mut w, variable, *storage_type, value)?,
                Step::BuildIndexIterator {
                    min_key,
                    max_key,
                    min_data,
                    max_data,
                } => {
                    w.line("embedDBIterator* it = (embedDBIterator*)malloc(sizeof(embedDBIterator));");
                    for (field, bound) in [
                        ("minKey", min_key),
                        ("maxKey", max_key),
                        ("minData", min_data),
                        ("maxData", max_data),
                    ] {
                        w.line(format!("it->{} = {};", field, bound.as_deref().unwrap_or("NULL")));
                    }
                    w.line("embedDBInitIterator(state, it);");
                    w.blank();
                }
                Step::BuildScan { schema, variable } => {
                    schema_struct(&mut w, schema);
                    w.line(format!(
                        "embedDBOperator* {} = createTableScanOperator(state, it, schema);",
                        variable
                    ));
                }
                Step::BuildSelection {
                    variable,
                    input,
                    column,
                    op,
                    value_variable,
                }
                | Step::BuildHaving {
                    variable,
                    input,
                    column,
                    op,
                    value_variable,
                } => {
                    w.line(format!(
                        "embedDBOperator* {} = createSelectionOperator({}, {}, {}, {});",
                        variable,
                        input,
                        column,
                        op.selection_constant(),
                        value_variable
                    ));
                }
                Step::BuildAggregate {
                    input,
                    descriptors,
                    packed,
                    variable,
                } => {
                    for descriptor in descriptors {
                        aggregate_descriptor(&mut w, descriptor)?;
                    }
                    w.line(format!(
                        "embedDBAggregateFunc* {} = (embedDBAggregateFunc*)malloc({} * sizeof(embedDBAggregateFunc));",
                        packed,
                        descriptors.len()
                    ));
                    for (i, descriptor) in descriptors.iter().enumerate() {
                        w.line(format!("{}[{}] = *{};", packed, i, descriptor.variable));
                    }
                    for transient in &program.transient {
                        w.line(format!("free({});", transient));
                    }
                    w.line(format!(
                        "embedDBOperator* {} = createAggregateOperator({}, groupFunction, {}, {});",
                        variable,
                        input,
                        packed,
                        descriptors.len()
                    ));
                }
            }
        }

        w.line(format!("{}->init({});", program.root, program.root));
        w.blank();
        w.line("embedDBFreeSchema(&schema);");
        w.blank();
        w.line(format!(
            "*allocatedValues = (void**)malloc({} * sizeof(void*));",
            program.allocations.len()
        ));
        for (i, variable) in program.allocations.iter().enumerate() {
            w.line(format!("((void**)*allocatedValues)[{}] = {};", i, variable));
        }
        w.blank();
        w.line(format!("return {};", program.root));
        w.close();
        Ok(w.finish())
    }

    fn exec_operator(program: &OperatorProgram) -> String {
        let mut w = CodeWriter::new();
        w.open("void execOperator(embedDBState* state) {");
        w.line("void** allocatedValues;");
        w.line("embedDBOperator* op = createOperator(state, &allocatedValues);");
        w.line("void* recordBuffer = op->recordBuffer;");
        for column in &program.output {
            if let Some((pointer_type, offset)) = column.pointer {
                let t = pointer_type.c_type();
                w.line(format!(
                    "{}* {} = ({}*)((int8_t*)recordBuffer + {});",
                    t, column.name, t, offset
                ));
            }
        }
        w.blank();

        let formats: Vec<&str> = program
            .output
            .iter()
            .map(|c| c.print_type.printf_spec())
            .collect();
        let values: Vec<String> = program.output.iter().map(|c| c.value_expression()).collect();

        w.line("// Print as csv");
        w.open("while (exec(op)) {");
        w.line(format!(
            "printf(\"{}\\n\", {});",
            formats.join(","),
            values.join(", ")
        ));
        w.close();
        w.line("printf(\"\\n\");");
        w.blank();
        w.line("op->close(op);");
        w.line("embedDBFreeOperatorRecursive(&op);");
        w.line("recordBuffer = NULL;");
        w.open(format!("for (int i = 0; i < {}; i++) {{", program.allocations.len()));
        w.line("free(allocatedValues[i]);");
        w.close();
        w.line("free(allocatedValues);");
        w.close();
        w.finish()
    }
}

fn math_helper(w: &mut CodeWriter, function: UnaryFunction) {
    match function {
        UnaryFunction::Floor => {
            w.open("int embedDBFloor(double x) {");
            w.line("int xi = (int)x;");
            w.line("return x < xi ? xi - 1 : xi;");
        }
        UnaryFunction::Ceil => {
            w.open("int embedDBCeil(double x) {");
            w.line("int xi = (int)x;");
            w.line("return x > xi ? xi + 1 : xi;");
        }
        UnaryFunction::Round => {
            w.open("int embedDBRound(double x) {");
            w.line("x += 0.5;");
            w.line("int xi = (int)x;");
            w.line("return x < xi ? xi - 1 : xi;");
        }
        UnaryFunction::Abs => {
            w.open("double embedDBAbs(double x) {");
            w.line("return x < 0 ? -x : x;");
        }
    }
    w.close();
}

fn allocate_literal(
    w: &mut CodeWriter,
    variable: &str,
    storage_type: LogicalType,
    value: &Literal,
) -> CompileResult<()> {
    let rendered = match value {
        Literal::Integer(v) => v.to_string(),
        Literal::Decimal(v) if storage_type.is_float() => format!("{:?}", v),
        other => {
            return Err(CompileError::internal(format!(
                "literal {} cannot be stored as {}",
                other, storage_type
            )))
        }
    };
    let t = storage_type.c_type();
    w.line(format!("{}* {} = ({}*)malloc(sizeof({}));", t, variable, t, t));
    w.line(format!("*{} = {};", variable, rendered));
    Ok(())
}

fn schema_struct(w: &mut CodeWriter, schema: &Schema) {
    let sizes: Vec<String> = schema.iter().map(|c| c.byte_size.to_string()).collect();
    let signedness: Vec<&str> = schema
        .iter()
        .map(|c| {
            if c.logical_type.is_signed() {
                "embedDB_COLUMN_SIGNED"
            } else {
                "embedDB_COLUMN_UNSIGNED"
            }
        })
        .collect();
    w.line(format!("uint8_t numCols = {};", schema.len()));
    w.line(format!("int8_t colSizes[] = {{{}}};", sizes.join(", ")));
    w.line(format!("int8_t colSignedness[] = {{{}}};", signedness.join(", ")));
    w.line("embedDBSchema* schema = embedDBCreateSchema(numCols, colSizes, colSignedness);");
}

fn aggregate_descriptor(w: &mut CodeWriter, descriptor: &AggregateDescriptor) -> CompileResult<()> {
    let source = || {
        descriptor.source_column.ok_or_else(|| {
            CompileError::internal(format!("descriptor {} has no source column", descriptor.variable))
        })
    };
    let var = &descriptor.variable;
    match descriptor.kind {
        AggregateKind::Min | AggregateKind::Max => {
            let size = i32::from(descriptor.output.byte_size);
            let signed = descriptor.source_type.map(|t| t.is_signed()).unwrap_or(false);
            let constructor = if descriptor.kind == AggregateKind::Min {
                "createMinAggregate"
            } else {
                "createMaxAggregate"
            };
            w.line(format!(
                "embedDBAggregateFunc* {} = {}({}, {});",
                var,
                constructor,
                source()?,
                if signed { -size } else { size }
            ));
        }
        AggregateKind::Count => {
            w.line(format!("embedDBAggregateFunc* {} = createCountAggregate();", var));
        }
        AggregateKind::Sum => {
            w.line(format!("embedDBAggregateFunc* {} = createSumAggregate({});", var, source()?));
        }
        AggregateKind::Avg => {
            w.line(format!(
                "embedDBAggregateFunc* {} = createAvgAggregate({}, {});",
                var,
                source()?,
                descriptor.output.byte_size
            ));
        }
        AggregateKind::CustomGroupExpr => {
            let compute = descriptor.compute.as_deref().ok_or_else(|| {
                CompileError::internal(format!("descriptor {} has no compute callback", var))
            })?;
            w.line(format!(
                "embedDBAggregateFunc* {} = (embedDBAggregateFunc*)calloc(1, sizeof(embedDBAggregateFunc));",
                var
            ));
            w.line(format!("{}->compute = {};", var, compute));
            w.line(format!("{}->colSize = {};", var, descriptor.output.byte_size));
        }
    }
    Ok(())
}
