//! Arithmetic expression translation
//!
//! Compiles a resolved `ScalarExpr` into an `ArithmeticExpr`: the subset of
//! scalar expressions the generated code can evaluate against a single
//! column value. Supported:
//! - column references and numeric literals
//! - `+ - * /`
//! - `floor`, `ceil` (`ceiling`), `abs`, `round`
//!
//! Each function registers its helper routine in the `HelperSet`.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::frontend::{ArithmeticOperator, Literal, ScalarExpr};

use super::errors::{CompileError, CompileResult};
use super::helpers::{HelperRoutine, HelperSet};

/// Scalar helper functions available to generated code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UnaryFunction {
    Floor,
    Ceil,
    Abs,
    Round,
}

impl UnaryFunction {
    /// Recognizes a function by SQL name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "floor" => Some(UnaryFunction::Floor),
            "ceil" | "ceiling" => Some(UnaryFunction::Ceil),
            "abs" => Some(UnaryFunction::Abs),
            "round" => Some(UnaryFunction::Round),
            _ => None,
        }
    }

    /// Name of the generated C helper
    pub fn helper_name(&self) -> &'static str {
        match self {
            UnaryFunction::Floor => "embedDBFloor",
            UnaryFunction::Ceil => "embedDBCeil",
            UnaryFunction::Abs => "embedDBAbs",
            UnaryFunction::Round => "embedDBRound",
        }
    }
}

/// Binary arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
        }
    }
}

/// Immutable expression tree over at most one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ArithmeticExpr {
    /// Exact integer constant
    Integer(i64),
    Decimal(f64),
    ColumnRef(usize),
    UnaryFunc {
        kind: UnaryFunction,
        operand: Box<ArithmeticExpr>,
    },
    BinaryOp {
        kind: BinaryOperator,
        left: Box<ArithmeticExpr>,
        right: Box<ArithmeticExpr>,
    },
}

impl ArithmeticExpr {
    /// Renders C source with every column reference replaced by `access`
    pub fn format_with(&self, access: &str) -> String {
        match self {
            ArithmeticExpr::Integer(value) => value.to_string(),
            ArithmeticExpr::Decimal(value) => format!("{:?}", value),
            ArithmeticExpr::ColumnRef(_) => access.to_string(),
            ArithmeticExpr::UnaryFunc { kind, operand } => {
                format!("{}({})", kind.helper_name(), operand.format_with(access))
            }
            ArithmeticExpr::BinaryOp { kind, left, right } => format!(
                "({} {} {})",
                left.format_with(access),
                kind.symbol(),
                right.format_with(access)
            ),
        }
    }

    /// The referenced column, if any
    pub fn column(&self) -> Option<usize> {
        self.columns().into_iter().next()
    }

    fn columns(&self) -> BTreeSet<usize> {
        let mut out = BTreeSet::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns(&self, out: &mut BTreeSet<usize>) {
        match self {
            ArithmeticExpr::Integer(_) | ArithmeticExpr::Decimal(_) => {}
            ArithmeticExpr::ColumnRef(col) => {
                out.insert(*col);
            }
            ArithmeticExpr::UnaryFunc { operand, .. } => operand.collect_columns(out),
            ArithmeticExpr::BinaryOp { left, right, .. } => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
        }
    }

    /// Float literals propagate through binary operators; helper functions
    /// and columns are integer-valued.
    pub fn is_float(&self) -> bool {
        match self {
            ArithmeticExpr::Decimal(_) => true,
            ArithmeticExpr::Integer(_) | ArithmeticExpr::ColumnRef(_) | ArithmeticExpr::UnaryFunc { .. } => {
                false
            }
            ArithmeticExpr::BinaryOp { left, right, .. } => left.is_float() || right.is_float(),
        }
    }
}

impl fmt::Display for ArithmeticExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let access = match self.column() {
            Some(col) => format!("col{}", col),
            None => String::new(),
        };
        write!(f, "{}", self.format_with(&access))
    }
}

/// Translates scalar expressions, registering helpers as it goes
pub struct ArithmeticTranslator<'a> {
    helpers: &'a mut HelperSet,
}

impl<'a> ArithmeticTranslator<'a> {
    pub fn new(helpers: &'a mut HelperSet) -> Self {
        Self { helpers }
    }

    /// Translate a whole expression
    pub fn translate(&mut self, expr: &ScalarExpr) -> CompileResult<ArithmeticExpr> {
        let translated = self.translate_node(expr)?;
        let columns = translated.columns();
        if columns.len() > 1 {
            return Err(CompileError::internal(format!(
                "expression must reference exactly one column, found {}",
                columns.len()
            )));
        }
        Ok(translated)
    }

    fn translate_node(&mut self, expr: &ScalarExpr) -> CompileResult<ArithmeticExpr> {
        match expr {
            ScalarExpr::Column(col) => Ok(ArithmeticExpr::ColumnRef(*col)),
            ScalarExpr::Literal(Literal::Integer(v)) => Ok(ArithmeticExpr::Integer(*v)),
            ScalarExpr::Literal(Literal::Decimal(v)) => Ok(ArithmeticExpr::Decimal(*v)),
            ScalarExpr::Literal(literal @ Literal::Text(_)) => Err(CompileError::type_error(
                format!("text literal {} cannot be used in arithmetic", literal),
            )),
            ScalarExpr::Function { name, arg } => {
                let kind = UnaryFunction::from_name(name).ok_or_else(|| {
                    CompileError::unsupported_expression(format!(
                        "function '{}' is not supported",
                        name
                    ))
                })?;
                self.helpers.register(HelperRoutine::Math(kind));
                Ok(ArithmeticExpr::UnaryFunc {
                    kind,
                    operand: Box::new(self.translate_node(arg)?),
                })
            }
            ScalarExpr::Binary { op, left, right } => {
                let kind = match op {
                    ArithmeticOperator::Plus => BinaryOperator::Add,
                    ArithmeticOperator::Minus => BinaryOperator::Sub,
                    ArithmeticOperator::Multiply => BinaryOperator::Mul,
                    ArithmeticOperator::Divide => BinaryOperator::Div,
                    other => {
                        return Err(CompileError::unsupported_expression(format!(
                            "operator '{}' is not supported",
                            other
                        )))
                    }
                };
                Ok(ArithmeticExpr::BinaryOp {
                    kind,
                    left: Box::new(self.translate_node(left)?),
                    right: Box::new(self.translate_node(right)?),
                })
            }
        }
    }
}
