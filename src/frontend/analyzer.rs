//! SQL analyzer
//!
//! Parses one SELECT with `sqlparser` and resolves it against the catalog.
//!
//! Accepted shape:
//! - one table in FROM (joins are resolved but left for the compiler to reject)
//! - WHERE as an AND-tree of `column OP literal` comparisons
//! - projections of columns, scalar expressions and MIN/MAX/SUM/COUNT/AVG
//! - GROUP BY and HAVING, with projection aliases allowed in both
//! - ORDER BY only when it restates the natural output order

use sqlparser::ast::{
    self as sp, BinaryOperator, Expr, FunctionArg, FunctionArgExpr, FunctionArguments,
    GroupByExpr, JoinOperator, SelectItem, SetExpr, Statement, TableFactor, UnaryOperator,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

use super::ast::{
    AggregateCall, AggregateFunction, AnalyzedQuery, ArithmeticOperator, CompareOp, Comparison,
    HavingExpr, HavingOperand, Literal, Projection, ProjectionKind, ScalarExpr,
};
use crate::catalog::{object_name, Catalog, TableDef};
use crate::compiler::{CompileError, CompileResult};

/// Identifiers the generated driver already declares, plus C keywords and
/// the runtime and libc names it calls
const RESERVED_NAMES: &[&str] = &[
    // driver locals
    "op",
    "recordBuffer",
    "allocatedValues",
    "state",
    "i",
    "exec",
    "lastRecord",
    "lastValue",
    "calculatedValue",
    "buf",
    // runtime and libc
    "createOperator",
    "execOperator",
    "embedDBFreeOperatorRecursive",
    "printf",
    "free",
    "malloc",
    "calloc",
    "memcpy",
    "NULL",
    "int8_t",
    "uint8_t",
    "int16_t",
    "uint16_t",
    "int32_t",
    "uint32_t",
    "int64_t",
    "uint64_t",
    // C keywords
    "auto",
    "break",
    "case",
    "char",
    "const",
    "continue",
    "default",
    "do",
    "double",
    "else",
    "enum",
    "extern",
    "float",
    "for",
    "goto",
    "if",
    "inline",
    "int",
    "long",
    "register",
    "restrict",
    "return",
    "short",
    "signed",
    "sizeof",
    "static",
    "struct",
    "switch",
    "typedef",
    "union",
    "unsigned",
    "void",
    "volatile",
    "while",
];

/// Parse and resolve a SELECT statement
pub fn analyze(catalog: &Catalog, sql: &str) -> CompileResult<AnalyzedQuery> {
    let statements = Parser::parse_sql(&GenericDialect {}, sql)
        .map_err(|e| CompileError::syntax(e.to_string()))?;

    let statement = match statements.as_slice() {
        [] => return Err(CompileError::syntax("empty query")),
        [statement] => statement,
        _ => {
            return Err(CompileError::unsupported_shape(format!(
                "expected exactly one statement, got {}",
                statements.len()
            )))
        }
    };

    match statement {
        Statement::Query(query) => analyze_query(catalog, query),
        _ => Err(CompileError::unsupported_shape(
            "only SELECT statements can be compiled",
        )),
    }
}

fn analyze_query(catalog: &Catalog, query: &sp::Query) -> CompileResult<AnalyzedQuery> {
    if query.with.is_some() {
        return Err(CompileError::unsupported_shape("WITH clauses are not supported"));
    }
    if query.limit.is_some() || query.offset.is_some() || query.fetch.is_some() {
        return Err(CompileError::unsupported_shape("LIMIT/OFFSET are not supported"));
    }

    let select = match query.body.as_ref() {
        SetExpr::Select(select) => select.as_ref(),
        _ => {
            return Err(CompileError::unsupported_shape(
                "only simple SELECT queries are supported (no UNION, INTERSECT, etc.)",
            ))
        }
    };
    if select.distinct.is_some() {
        return Err(CompileError::unsupported_shape("DISTINCT is not supported"));
    }

    let (tables, aliases, outer_join) = resolve_tables(catalog, select)?;
    if tables.len() != 1 {
        // Column resolution is ambiguous across tables; the compiler rejects
        // the shape from the range variables alone.
        let index_hints = tables[0].index_hints();
        return Ok(AnalyzedQuery {
            tables,
            outer_join,
            index_hints,
            predicates: Vec::new(),
            aggregated: false,
            group_by: Vec::new(),
            having: Vec::new(),
            projections: Vec::new(),
        });
    }

    let resolver = NameResolver {
        table: &tables[0],
        alias: aliases[0].clone(),
    };

    let projections = resolver.projections(&select.projection)?;

    let mut predicates = Vec::new();
    if let Some(selection) = &select.selection {
        resolver.flatten_where(selection, &mut predicates)?;
    }

    let group_by = match &select.group_by {
        GroupByExpr::All(_) => {
            return Err(CompileError::unsupported_shape("GROUP BY ALL is not supported"))
        }
        GroupByExpr::Expressions(exprs, _) => exprs
            .iter()
            .map(|e| resolver.group_expr(e, &projections))
            .collect::<CompileResult<Vec<_>>>()?,
    };

    let mut having = Vec::new();
    if let Some(expr) = &select.having {
        resolver.flatten_having(expr, &projections, &mut having)?;
    }

    let aggregated = projections
        .iter()
        .any(|p| matches!(p.kind, ProjectionKind::Aggregate(_)))
        || having.iter().any(having_has_aggregate);

    if let Some(order_by) = &query.order_by {
        resolver.check_order_by(order_by, &projections, &group_by, aggregated)?;
    }

    let table = tables[0].clone();
    Ok(AnalyzedQuery {
        index_hints: table.index_hints(),
        tables: vec![table],
        outer_join,
        predicates,
        aggregated,
        group_by,
        having,
        projections,
    })
}

type ResolvedTables = (Vec<TableDef>, Vec<Option<String>>, bool);

fn resolve_tables(catalog: &Catalog, select: &sp::Select) -> CompileResult<ResolvedTables> {
    if select.from.is_empty() {
        return Err(CompileError::unsupported_shape("missing FROM clause"));
    }

    let mut tables = Vec::new();
    let mut aliases = Vec::new();
    let mut outer_join = false;

    for table_with_joins in &select.from {
        let mut factors = vec![&table_with_joins.relation];
        for join in &table_with_joins.joins {
            if matches!(
                join.join_operator,
                JoinOperator::LeftOuter(_) | JoinOperator::RightOuter(_) | JoinOperator::FullOuter(_)
            ) {
                outer_join = true;
            }
            factors.push(&join.relation);
        }

        for factor in factors {
            match factor {
                TableFactor::Table { name, alias, .. } => {
                    let table_name = object_name(name);
                    let table = catalog
                        .table(&table_name)
                        .ok_or_else(|| CompileError::unknown_table(&table_name))?;
                    tables.push(table.clone());
                    aliases.push(alias.as_ref().map(|a| a.name.value.clone()));
                }
                _ => {
                    return Err(CompileError::unsupported_shape(
                        "only plain table references are supported in FROM",
                    ))
                }
            }
        }
    }

    Ok((tables, aliases, outer_join))
}

fn having_has_aggregate(having: &HavingExpr) -> bool {
    match having {
        HavingExpr::Comparison { left, right, .. } => [left, right].iter().any(|operand| {
            matches!(operand, HavingOperand::Projected(ProjectionKind::Aggregate(_)))
        }),
        HavingExpr::Unsupported(_) => false,
    }
}

fn compare_op(op: &BinaryOperator) -> Option<CompareOp> {
    match op {
        BinaryOperator::Eq => Some(CompareOp::Eq),
        BinaryOperator::NotEq => Some(CompareOp::NotEq),
        BinaryOperator::Lt => Some(CompareOp::Lt),
        BinaryOperator::LtEq => Some(CompareOp::LtEq),
        BinaryOperator::Gt => Some(CompareOp::Gt),
        BinaryOperator::GtEq => Some(CompareOp::GtEq),
        _ => None,
    }
}

fn arithmetic_op(op: &BinaryOperator) -> Option<ArithmeticOperator> {
    match op {
        BinaryOperator::Plus => Some(ArithmeticOperator::Plus),
        BinaryOperator::Minus => Some(ArithmeticOperator::Minus),
        BinaryOperator::Multiply => Some(ArithmeticOperator::Multiply),
        BinaryOperator::Divide => Some(ArithmeticOperator::Divide),
        BinaryOperator::Modulo => Some(ArithmeticOperator::Modulo),
        _ => None,
    }
}

/// Literal value of an expression, if it is one
fn literal(expr: &Expr) -> CompileResult<Option<Literal>> {
    match expr {
        Expr::Value(sp::Value::Number(text, _)) => parse_number(text).map(Some),
        Expr::Value(sp::Value::SingleQuotedString(s))
        | Expr::Value(sp::Value::DoubleQuotedString(s)) => Ok(Some(Literal::Text(s.clone()))),
        Expr::UnaryOp {
            op: UnaryOperator::Minus,
            expr: inner,
        } => Ok(match literal(inner)? {
            Some(Literal::Integer(v)) => Some(Literal::Integer(-v)),
            Some(Literal::Decimal(v)) => Some(Literal::Decimal(-v)),
            _ => None,
        }),
        Expr::UnaryOp {
            op: UnaryOperator::Plus,
            expr: inner,
        }
        | Expr::Nested(inner) => literal(inner),
        _ => Ok(None),
    }
}

fn parse_number(text: &str) -> CompileResult<Literal> {
    if text.contains(['.', 'e', 'E']) {
        return text
            .parse::<f64>()
            .map(Literal::Decimal)
            .map_err(|_| CompileError::syntax(format!("cannot parse number '{}'", text)));
    }
    text.parse::<i64>()
        .map(Literal::Integer)
        .map_err(|_| CompileError::type_error(format!("integer literal {} is out of range", text)))
}

fn is_subquery(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Subquery(_) | Expr::InSubquery { .. } | Expr::Exists { .. }
    )
}

/// Turns a name into a C identifier
fn sanitize_identifier(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    if RESERVED_NAMES.contains(&out.as_str()) {
        out.push('_');
    }
    out
}

struct NameResolver<'a> {
    table: &'a TableDef,
    alias: Option<String>,
}

impl NameResolver<'_> {
    fn column(&self, name: &str) -> CompileResult<usize> {
        self.table
            .column_index(name)
            .ok_or_else(|| CompileError::unknown_column(name, &self.table.name))
    }

    fn qualified_column(&self, parts: &[sp::Ident]) -> CompileResult<usize> {
        let full_name = parts
            .iter()
            .map(|p| p.value.as_str())
            .collect::<Vec<_>>()
            .join(".");
        match parts {
            [qualifier, column] => {
                let matches_table = qualifier.value.eq_ignore_ascii_case(&self.table.name)
                    || self
                        .alias
                        .as_deref()
                        .is_some_and(|a| a.eq_ignore_ascii_case(&qualifier.value));
                if !matches_table {
                    return Err(CompileError::unknown_column(full_name, &self.table.name));
                }
                self.column(&column.value)
            }
            _ => Err(CompileError::unknown_column(full_name, &self.table.name)),
        }
    }

    /// Column number of a plain (optionally qualified) column reference
    fn column_ref(&self, expr: &Expr) -> CompileResult<Option<usize>> {
        match expr {
            Expr::Identifier(ident) => self.column(&ident.value).map(Some),
            Expr::CompoundIdentifier(parts) => self.qualified_column(parts).map(Some),
            Expr::Nested(inner) => self.column_ref(inner),
            _ => Ok(None),
        }
    }

    // =========================================================================
    // Projections
    // =========================================================================

    fn projections(&self, items: &[SelectItem]) -> CompileResult<Vec<Projection>> {
        let mut projections: Vec<Projection> = Vec::new();

        for item in items {
            let (kind, alias) = match item {
                SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(_, _) => {
                    for (i, column) in self.table.columns.iter().enumerate() {
                        push_projection(&mut projections, ProjectionKind::Column(i), column.name.clone(), None);
                    }
                    continue;
                }
                SelectItem::UnnamedExpr(expr) => (self.projection_kind(expr)?, None),
                SelectItem::ExprWithAlias { expr, alias } => {
                    (self.projection_kind(expr)?, Some(alias.value.clone()))
                }
            };

            let name = alias
                .clone()
                .unwrap_or_else(|| self.default_name(&kind, projections.len()));
            push_projection(&mut projections, kind, name, alias);
        }

        Ok(projections)
    }

    fn default_name(&self, kind: &ProjectionKind, position: usize) -> String {
        let column_name = |col: usize| {
            self.table
                .columns
                .get(col)
                .map(|c| c.name.clone())
                .unwrap_or_default()
        };
        match kind {
            ProjectionKind::Column(col) => column_name(*col),
            ProjectionKind::Aggregate(call) => match call.argument {
                Some(col) if call.function != AggregateFunction::Count => {
                    format!("{}_{}", call.function.name(), column_name(col))
                }
                _ => call.function.name().to_string(),
            },
            _ => format!("expr{}", position),
        }
    }

    fn projection_kind(&self, expr: &Expr) -> CompileResult<ProjectionKind> {
        if let Some(col) = self.column_ref(expr)? {
            return Ok(ProjectionKind::Column(col));
        }
        if let Some(call) = self.aggregate_call(expr)? {
            return Ok(ProjectionKind::Aggregate(call));
        }
        Ok(ProjectionKind::Arithmetic(self.scalar(expr)?))
    }

    fn aggregate_call(&self, expr: &Expr) -> CompileResult<Option<AggregateCall>> {
        let func = match expr {
            Expr::Function(func) => func,
            Expr::Nested(inner) => return self.aggregate_call(inner),
            _ => return Ok(None),
        };
        let name = object_name(&func.name);
        let function = match AggregateFunction::from_name(&name) {
            Some(function) => function,
            None => return Ok(None),
        };
        if func.over.is_some() || func.filter.is_some() {
            return Err(CompileError::unsupported_shape(format!(
                "window or filtered aggregate '{}' is not supported",
                expr
            )));
        }

        let list = match &func.args {
            FunctionArguments::List(list) => list,
            FunctionArguments::Subquery(_) => {
                return Err(CompileError::unsupported_shape("subqueries are not supported"))
            }
            FunctionArguments::None => {
                return Err(CompileError::unsupported_expression(format!(
                    "{} requires an argument",
                    name
                )))
            }
        };
        if list.duplicate_treatment.is_some() {
            return Err(CompileError::unsupported_shape(format!(
                "DISTINCT/ALL inside '{}' is not supported",
                expr
            )));
        }

        let argument = match list.args.as_slice() {
            [FunctionArg::Unnamed(FunctionArgExpr::Wildcard)]
                if function == AggregateFunction::Count =>
            {
                None
            }
            [FunctionArg::Unnamed(FunctionArgExpr::Expr(arg))] => {
                if self.aggregate_call(arg)?.is_some() {
                    return Err(CompileError::unsupported_expression(format!(
                        "nested aggregate in '{}'",
                        expr
                    )));
                }
                match self.column_ref(arg)? {
                    Some(col) => Some(col),
                    None => {
                        return Err(CompileError::unsupported_expression(format!(
                            "aggregate arguments must be plain columns: '{}'",
                            expr
                        )))
                    }
                }
            }
            _ => {
                return Err(CompileError::unsupported_expression(format!(
                    "unsupported arguments in '{}'",
                    expr
                )))
            }
        };

        Ok(Some(AggregateCall::new(function, argument)))
    }

    // =========================================================================
    // Scalar expressions
    // =========================================================================

    fn scalar(&self, expr: &Expr) -> CompileResult<ScalarExpr> {
        if let Some(value) = literal(expr)? {
            return Ok(ScalarExpr::Literal(value));
        }
        if let Some(col) = self.column_ref(expr)? {
            return Ok(ScalarExpr::Column(col));
        }
        if is_subquery(expr) {
            return Err(CompileError::unsupported_shape("subqueries are not supported"));
        }

        match expr {
            Expr::Nested(inner) => self.scalar(inner),
            Expr::UnaryOp {
                op: UnaryOperator::Minus,
                expr: inner,
            } => Ok(ScalarExpr::binary(
                ArithmeticOperator::Minus,
                ScalarExpr::Literal(Literal::Integer(0)),
                self.scalar(inner)?,
            )),
            Expr::UnaryOp {
                op: UnaryOperator::Plus,
                expr: inner,
            } => self.scalar(inner),
            Expr::BinaryOp { left, op, right } => {
                let op = arithmetic_op(op).ok_or_else(|| {
                    CompileError::unsupported_expression(format!(
                        "operator '{}' is not supported in expressions",
                        op
                    ))
                })?;
                Ok(ScalarExpr::binary(op, self.scalar(left)?, self.scalar(right)?))
            }
            Expr::Floor { expr: inner, .. } => {
                Ok(ScalarExpr::function("floor", self.scalar(inner)?))
            }
            Expr::Ceil { expr: inner, .. } => Ok(ScalarExpr::function("ceil", self.scalar(inner)?)),
            Expr::Function(func) => {
                if self.aggregate_call(expr)?.is_some() {
                    return Err(CompileError::unsupported_expression(format!(
                        "aggregates cannot be used inside expressions: '{}'",
                        expr
                    )));
                }
                let name = object_name(&func.name).to_ascii_lowercase();
                let arg = match &func.args {
                    FunctionArguments::List(list) => match list.args.as_slice() {
                        [FunctionArg::Unnamed(FunctionArgExpr::Expr(arg))] => arg,
                        _ => {
                            return Err(CompileError::unsupported_expression(format!(
                                "function '{}' must take exactly one argument",
                                name
                            )))
                        }
                    },
                    _ => {
                        return Err(CompileError::unsupported_expression(format!(
                            "function '{}' must take exactly one argument",
                            name
                        )))
                    }
                };
                Ok(ScalarExpr::function(name, self.scalar(arg)?))
            }
            other => Err(CompileError::unsupported_expression(format!(
                "expression '{}' is not supported",
                other
            ))),
        }
    }

    /// Projection target of an alias, following `AliasOf`
    fn projection_by_alias<'p>(
        &self,
        name: &str,
        projections: &'p [Projection],
    ) -> Option<&'p ProjectionKind> {
        let position = projections
            .iter()
            .position(|p| p.answers_to(name))?;
        let mut kind = &projections[position].kind;
        while let ProjectionKind::AliasOf(target) = kind {
            kind = &projections.get(*target)?.kind;
        }
        Some(kind)
    }

    fn group_expr(&self, expr: &Expr, projections: &[Projection]) -> CompileResult<ScalarExpr> {
        if let Expr::Identifier(ident) = expr {
            if self.table.column_index(&ident.value).is_none() {
                if let Some(kind) = self.projection_by_alias(&ident.value, projections) {
                    return match kind {
                        ProjectionKind::Column(col) => Ok(ScalarExpr::Column(*col)),
                        ProjectionKind::Arithmetic(expr) => Ok(expr.clone()),
                        _ => Err(CompileError::unsupported_shape(format!(
                            "cannot group by aggregate '{}'",
                            ident.value
                        ))),
                    };
                }
            }
        }
        self.scalar(expr)
    }

    // =========================================================================
    // WHERE
    // =========================================================================

    fn flatten_where(&self, expr: &Expr, out: &mut Vec<Comparison>) -> CompileResult<()> {
        match expr {
            Expr::Nested(inner) => self.flatten_where(inner, out),
            Expr::BinaryOp {
                left,
                op: BinaryOperator::And,
                right,
            } => {
                self.flatten_where(left, out)?;
                self.flatten_where(right, out)
            }
            Expr::BinaryOp {
                op: BinaryOperator::Or,
                ..
            } => Err(CompileError::unsupported_shape(
                "disjunctive (OR) predicates are not supported",
            )),
            Expr::BinaryOp { left, op, right } if compare_op(op).is_some() => {
                let op = compare_op(op).ok_or_else(|| CompileError::internal("comparison lost"))?;
                if is_subquery(left) || is_subquery(right) {
                    return Err(CompileError::unsupported_shape("subqueries are not supported"));
                }
                let comparison = match (self.column_ref(left)?, literal(right)?) {
                    (Some(col), Some(value)) => Comparison::new(col, op, value),
                    _ => match (literal(left)?, self.column_ref(right)?) {
                        (Some(value), Some(col)) => Comparison::new(col, op.flip(), value),
                        _ => {
                            return Err(CompileError::unsupported_shape(format!(
                                "WHERE conditions must compare a column with a literal: '{}'",
                                expr
                            )))
                        }
                    },
                };
                out.push(comparison);
                Ok(())
            }
            other if is_subquery(other) => {
                Err(CompileError::unsupported_shape("subqueries are not supported"))
            }
            other => Err(CompileError::unsupported_shape(format!(
                "WHERE conditions must be comparisons joined by AND: '{}'",
                other
            ))),
        }
    }

    // =========================================================================
    // HAVING
    // =========================================================================

    fn flatten_having(
        &self,
        expr: &Expr,
        projections: &[Projection],
        out: &mut Vec<HavingExpr>,
    ) -> CompileResult<()> {
        match expr {
            Expr::Nested(inner) => self.flatten_having(inner, projections, out),
            Expr::BinaryOp {
                left,
                op: BinaryOperator::And,
                right,
            } => {
                self.flatten_having(left, projections, out)?;
                self.flatten_having(right, projections, out)
            }
            Expr::BinaryOp {
                op: BinaryOperator::Or,
                ..
            } => Err(CompileError::unsupported_shape(
                "disjunctive (OR) predicates are not supported",
            )),
            Expr::BinaryOp { left, op, right } if compare_op(op).is_some() => {
                let op = compare_op(op).ok_or_else(|| CompileError::internal("comparison lost"))?;
                out.push(HavingExpr::Comparison {
                    op,
                    left: self.having_operand(left, projections)?,
                    right: self.having_operand(right, projections)?,
                });
                Ok(())
            }
            other => {
                out.push(HavingExpr::Unsupported(other.to_string()));
                Ok(())
            }
        }
    }

    fn having_operand(&self, expr: &Expr, projections: &[Projection]) -> CompileResult<HavingOperand> {
        if let Some(value) = literal(expr)? {
            return Ok(HavingOperand::Literal(value));
        }
        if let Expr::Identifier(ident) = expr {
            if let Some(kind) = self.projection_by_alias(&ident.value, projections) {
                return Ok(HavingOperand::Projected(kind.clone()));
            }
        }
        if let Some(col) = self.column_ref(expr)? {
            return Ok(HavingOperand::Projected(ProjectionKind::Column(col)));
        }
        if let Some(call) = self.aggregate_call(expr)? {
            return Ok(HavingOperand::Projected(ProjectionKind::Aggregate(call)));
        }
        Ok(HavingOperand::Expression(expr.to_string()))
    }

    // =========================================================================
    // ORDER BY
    // =========================================================================

    fn check_order_by(
        &self,
        order_by: &sp::OrderBy,
        projections: &[Projection],
        group_by: &[ScalarExpr],
        aggregated: bool,
    ) -> CompileResult<()> {
        let item = match order_by.exprs.as_slice() {
            [] => return Ok(()),
            [item] => item,
            _ => {
                return Err(CompileError::unsupported_shape(
                    "ORDER BY with more than one expression is not supported",
                ))
            }
        };

        let expr = match &item.expr {
            Expr::Identifier(ident) => match self.projection_by_alias(&ident.value, projections) {
                Some(ProjectionKind::Column(col)) => ScalarExpr::Column(*col),
                Some(ProjectionKind::Arithmetic(expr)) => expr.clone(),
                Some(_) => {
                    return Err(CompileError::unsupported_shape(
                        "ORDER BY an aggregate is not supported",
                    ))
                }
                None => self.scalar(&item.expr)?,
            },
            other => self.scalar(other)?,
        };

        let natural_order = if group_by.is_empty() && !aggregated {
            expr == ScalarExpr::Column(0) && self.table.primary_key == Some(0)
        } else {
            group_by.first() == Some(&expr)
        };

        if natural_order && item.asc != Some(false) {
            Ok(())
        } else {
            Err(CompileError::unsupported_shape(format!(
                "ORDER BY '{}' does not match the scan or group order",
                item.expr
            )))
        }
    }
}

/// Adds a projection, turning exact repeats into aliases and making the
/// output name a unique C identifier.
fn push_projection(
    projections: &mut Vec<Projection>,
    kind: ProjectionKind,
    name: String,
    alias: Option<String>,
) {
    let kind = match projections
        .iter()
        .position(|p| p.kind == kind && !matches!(p.kind, ProjectionKind::AliasOf(_)))
    {
        Some(earlier) => ProjectionKind::AliasOf(earlier),
        None => kind,
    };

    let base = sanitize_identifier(&name);
    let mut unique = base.clone();
    let mut n = 2;
    while projections.iter().any(|p| p.name == unique) {
        unique = format!("{}_{}", base, n);
        n += 1;
    }
    let mut projection = Projection::new(unique, kind);
    projection.alias = alias;
    projections.push(projection);
}
