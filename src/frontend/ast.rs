//! Analyzed query representation
//!
//! The front end resolves names against the catalog and produces an
//! `AnalyzedQuery`. The compiler core only reads it. Column references are
//! column numbers of the first table; projection references are positions in
//! `projections`.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::catalog::{IndexHint, TableDef};

/// Comparison operator of an atomic predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    /// Operator with its operands swapped (`5 < a` becomes `a > 5`)
    pub fn flip(self) -> CompareOp {
        match self {
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::LtEq => CompareOp::GtEq,
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::GtEq => CompareOp::LtEq,
            other => other,
        }
    }

    /// Short tag used in generated identifiers
    pub fn suffix(self) -> &'static str {
        match self {
            CompareOp::Eq => "EQ",
            CompareOp::NotEq => "NEQ",
            CompareOp::Lt => "LT",
            CompareOp::LtEq => "LTE",
            CompareOp::Gt => "GT",
            CompareOp::GtEq => "GTE",
        }
    }

    /// Selection operator constant of the record store API
    pub fn selection_constant(self) -> String {
        format!("SELECT_{}", self.suffix())
    }

    /// SQL spelling
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Literal value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Integer(i64),
    Decimal(f64),
    Text(String),
}

impl Literal {
    /// Integer value, if this is an integer literal
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Literal::Integer(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(v) => write!(f, "{}", v),
            Literal::Decimal(v) => write!(f, "{:?}", v),
            Literal::Text(s) => write!(f, "'{}'", s),
        }
    }
}

/// Atomic WHERE comparison, always `column OP literal`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub column: usize,
    pub op: CompareOp,
    pub literal: Literal,
}

impl Comparison {
    pub fn new(column: usize, op: CompareOp, literal: Literal) -> Self {
        Self {
            column,
            op,
            literal,
        }
    }
}

/// Binary arithmetic operator as written in SQL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArithmeticOperator {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
}

impl fmt::Display for ArithmeticOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            ArithmeticOperator::Plus => "+",
            ArithmeticOperator::Minus => "-",
            ArithmeticOperator::Multiply => "*",
            ArithmeticOperator::Divide => "/",
            ArithmeticOperator::Modulo => "%",
        };
        write!(f, "{}", symbol)
    }
}

/// Resolved scalar expression
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ScalarExpr {
    Column(usize),
    Literal(Literal),
    Function {
        name: String,
        arg: Box<ScalarExpr>,
    },
    Binary {
        op: ArithmeticOperator,
        left: Box<ScalarExpr>,
        right: Box<ScalarExpr>,
    },
}

impl ScalarExpr {
    pub fn function(name: impl Into<String>, arg: ScalarExpr) -> Self {
        ScalarExpr::Function {
            name: name.into(),
            arg: Box::new(arg),
        }
    }

    pub fn binary(op: ArithmeticOperator, left: ScalarExpr, right: ScalarExpr) -> Self {
        ScalarExpr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Distinct column numbers referenced, ascending
    pub fn columns(&self) -> BTreeSet<usize> {
        let mut columns = BTreeSet::new();
        self.collect_columns(&mut columns);
        columns
    }

    fn collect_columns(&self, out: &mut BTreeSet<usize>) {
        match self {
            ScalarExpr::Column(col) => {
                out.insert(*col);
            }
            ScalarExpr::Literal(_) => {}
            ScalarExpr::Function { arg, .. } => arg.collect_columns(out),
            ScalarExpr::Binary { left, right, .. } => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
        }
    }

    /// Decimal literals make a binary expression float-valued; functions
    /// and columns are integer-valued.
    pub fn is_float(&self) -> bool {
        match self {
            ScalarExpr::Literal(Literal::Decimal(_)) => true,
            ScalarExpr::Literal(_) | ScalarExpr::Column(_) | ScalarExpr::Function { .. } => false,
            ScalarExpr::Binary { left, right, .. } => left.is_float() || right.is_float(),
        }
    }
}

/// Supported aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AggregateFunction {
    Min,
    Max,
    Sum,
    Count,
    Avg,
}

impl AggregateFunction {
    /// Recognizes an aggregate by SQL name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "min" => Some(AggregateFunction::Min),
            "max" => Some(AggregateFunction::Max),
            "sum" => Some(AggregateFunction::Sum),
            "count" => Some(AggregateFunction::Count),
            "avg" => Some(AggregateFunction::Avg),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Count => "count",
            AggregateFunction::Avg => "avg",
        }
    }
}

/// Aggregate call over at most one plain column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateCall {
    pub function: AggregateFunction,
    /// `None` only for `COUNT(*)`
    pub argument: Option<usize>,
}

impl AggregateCall {
    pub fn new(function: AggregateFunction, argument: Option<usize>) -> Self {
        Self { function, argument }
    }
}

/// What a projection computes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ProjectionKind {
    Column(usize),
    Arithmetic(ScalarExpr),
    Aggregate(AggregateCall),
    /// Same value as an earlier projection
    AliasOf(usize),
}

/// One output column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    /// Output name, a valid C identifier, unique within the query
    pub name: String,
    /// `AS` alias as written; GROUP BY, HAVING and ORDER BY resolve against it
    pub alias: Option<String>,
    pub kind: ProjectionKind,
}

impl Projection {
    pub fn new(name: impl Into<String>, kind: ProjectionKind) -> Self {
        Self {
            name: name.into(),
            alias: None,
            kind,
        }
    }

    /// True if `name` refers to this projection: its alias if it has one,
    /// otherwise its output name
    pub fn answers_to(&self, name: &str) -> bool {
        self.alias.as_deref().unwrap_or(&self.name).eq_ignore_ascii_case(name)
    }
}

/// One side of a HAVING comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum HavingOperand {
    /// A projected value (aliases already followed to their target)
    Projected(ProjectionKind),
    Literal(Literal),
    /// Anything else, kept as SQL text for the error message
    Expression(String),
}

/// HAVING condition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum HavingExpr {
    Comparison {
        op: CompareOp,
        left: HavingOperand,
        right: HavingOperand,
    },
    /// Not a comparison (e.g. a bare column or a nested boolean)
    Unsupported(String),
}

/// Single-table query after name resolution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzedQuery {
    /// Range variables; the compiler requires exactly one
    pub tables: Vec<TableDef>,
    pub outer_join: bool,
    /// Best index per column of the first table
    pub index_hints: Vec<IndexHint>,
    /// WHERE conjuncts
    pub predicates: Vec<Comparison>,
    /// True if any projection or HAVING operand is an aggregate
    pub aggregated: bool,
    pub group_by: Vec<ScalarExpr>,
    pub having: Vec<HavingExpr>,
    pub projections: Vec<Projection>,
}

impl AnalyzedQuery {
    /// Query over one table with no predicates, grouping or projections
    pub fn over(table: TableDef) -> Self {
        let index_hints = table.index_hints();
        Self {
            tables: vec![table],
            outer_join: false,
            index_hints,
            predicates: Vec::new(),
            aggregated: false,
            group_by: Vec::new(),
            having: Vec::new(),
            projections: Vec::new(),
        }
    }

    /// Project every table column in declaration order
    pub fn select_all(mut self) -> Self {
        if let Some(table) = self.tables.first() {
            self.projections = table
                .columns
                .iter()
                .enumerate()
                .map(|(i, c)| Projection::new(c.name.clone(), ProjectionKind::Column(i)))
                .collect();
        }
        self
    }

    pub fn project(mut self, name: impl Into<String>, kind: ProjectionKind) -> Self {
        if matches!(kind, ProjectionKind::Aggregate(_)) {
            self.aggregated = true;
        }
        self.projections.push(Projection::new(name, kind));
        self
    }

    pub fn filter(mut self, column: usize, op: CompareOp, literal: Literal) -> Self {
        self.predicates.push(Comparison::new(column, op, literal));
        self
    }

    pub fn group_by(mut self, expr: ScalarExpr) -> Self {
        self.group_by.push(expr);
        self
    }

    pub fn having(mut self, having: HavingExpr) -> Self {
        if let HavingExpr::Comparison { left, right, .. } = &having {
            let is_aggregate = |operand: &HavingOperand| {
                matches!(operand, HavingOperand::Projected(ProjectionKind::Aggregate(_)))
            };
            if is_aggregate(left) || is_aggregate(right) {
                self.aggregated = true;
            }
        }
        self.having.push(having);
        self
    }

    /// True if the query needs an aggregate operator
    pub fn is_grouped(&self) -> bool {
        self.aggregated || !self.group_by.is_empty()
    }

    /// First table, if any
    pub fn table(&self) -> Option<&TableDef> {
        self.tables.first()
    }
}
