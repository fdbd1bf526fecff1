//! Sandboxed arithmetic formulas for data-driven stat modifiers.
//!
//! Formulas arrive as untrusted text (typically from a content file) and may
//! only perform whitelisted arithmetic over caller-supplied numbers:
//!
//! - **Closed grammar**: numbers, names, unary `+ - ~`, binary
//!   `+ - * / // % ** | & ^ << >>`, calls by name, and parentheses
//! - **Reject, don't repair**: any other construct fails at parse time
//! - **Whitelisted calls**: only the math functions in [`Function`]
//! - **No ambient state**: evaluation reads nothing but the [`Bindings`]
//!
//! # Example
//!
//! ```
//! use stat_formula::Formula;
//!
//! let formula = Formula::parse("base_value * 2 + SPEED // 5").unwrap();
//! assert_eq!(formula.variables(), ["SPEED", "base_value"]);
//!
//! let value = formula
//!     .evaluate(&[("base_value", 3.0), ("SPEED", 7.0)])
//!     .unwrap();
//! assert_eq!(value, 7.0);
//! ```

pub mod ast;
pub mod error;
pub mod function;

mod eval;
mod lexer;
mod parser;

use std::fmt;
use std::str::FromStr;

use tracing::{debug, trace};

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use error::{Construct, EvalError, FormulaError, ParseError};
pub use eval::Bindings;
pub use function::{Arity, Function};

use lexer::Lexer;
use parser::Parser;

// ============================================================================
// Parse Limits
// ============================================================================

/// Bounds on the parse cost of a single formula.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ParseLimits {
    /// Maximum formula length in bytes.
    pub max_len: usize,
    /// Maximum nesting of parentheses, unary operators and exponents.
    pub max_depth: usize,
}

impl ParseLimits {
    pub const DEFAULT_MAX_LEN: usize = 1024;
    pub const DEFAULT_MAX_DEPTH: usize = 64;

    pub const fn new() -> Self {
        Self {
            max_len: Self::DEFAULT_MAX_LEN,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    #[must_use]
    pub const fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Compiled Formula
// ============================================================================

/// A formula that passed every sandbox check and is ready to evaluate.
///
/// Keeps the original text for diagnostics and the sorted, de-duplicated
/// list of free variable names so callers know which bindings to supply.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct Formula {
    source: String,
    expr: Expr,
    variables: Vec<String>,
}

impl Formula {
    /// Parses `source` with the default [`ParseLimits`].
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        Self::parse_with_limits(source, &ParseLimits::default())
    }

    /// Parses `source`, rejecting it if it leaves the arithmetic whitelist or
    /// exceeds `limits`.
    pub fn parse_with_limits(source: &str, limits: &ParseLimits) -> Result<Self, FormulaError> {
        let reject = |reason: ParseError| {
            trace!(expression = source, %reason, "formula rejected");
            FormulaError::ParseRejected {
                expression: source.to_string(),
                reason,
            }
        };

        if source.contains(['\n', '\r']) {
            return Err(reject(ParseError::Multiline));
        }
        if let Some(position) = source.find('#') {
            return Err(reject(ParseError::Comment { position }));
        }
        if source.len() > limits.max_len {
            return Err(reject(ParseError::TooLong {
                len: source.len(),
                max: limits.max_len,
            }));
        }

        let tokens = Lexer::new(source).tokenize().map_err(reject)?;
        let expr = Parser::new(tokens, limits.max_depth)
            .parse()
            .map_err(reject)?;
        let variables = expr.free_variables().into_iter().collect::<Vec<_>>();

        debug!(expression = source, ?variables, "formula compiled");
        Ok(Self {
            source: source.to_string(),
            expr,
            variables,
        })
    }

    /// Original formula text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Compiled syntax tree.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Free variable names, sorted and de-duplicated.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Evaluates the formula against `bindings`.
    ///
    /// Every free variable must be bound; a failure names the sub-expression
    /// that produced it.
    pub fn evaluate<B: Bindings + ?Sized>(&self, bindings: &B) -> Result<f64, FormulaError> {
        eval::eval(&self.expr, bindings).map_err(|(reason, node)| FormulaError::EvalFailed {
            expression: self.source.clone(),
            sub_expression: node.to_string(),
            reason,
        })
    }
}

impl FromStr for Formula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Formula {
    type Error = FormulaError;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Self::parse(&source)
    }
}

impl From<Formula> for String {
    fn from(formula: Formula) -> Self {
        formula.source
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parses `source` with the default limits.
pub fn parse(source: &str) -> Result<Formula, FormulaError> {
    Formula::parse(source)
}

/// Evaluates a compiled formula against `bindings`.
pub fn evaluate<B: Bindings + ?Sized>(formula: &Formula, bindings: &B) -> Result<f64, FormulaError> {
    formula.evaluate(bindings)
}
