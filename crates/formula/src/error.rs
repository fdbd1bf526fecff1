//! Formula errors.
//!
//! Parsing and evaluation fail with distinct error types so callers can tell
//! "this data file contains a forbidden formula" apart from "this formula hit
//! a math error with the current inputs". Both are wrapped by [`FormulaError`],
//! which carries the original expression text for diagnostics.

use crate::ast::BinaryOp;

// ============================================================================
// Parse Errors
// ============================================================================

/// Syntax construct that exists in general-purpose languages but is never
/// accepted by the sandbox.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Construct {
    /// `x = 1`, `f(x=1)`, `x += 1`
    Assignment,
    /// `os.system`
    AttributeAccess,
    /// `a[0]`, `[1, 2]`, `{}`
    Subscript,
    /// `'text'`, `"text"`
    StringLiteral,
    /// `1; 2`
    StatementSeparator,
    /// `a < b`, `a == b`, `a != b`
    Comparison,
    /// `a if c else b`
    Conditional,
    /// `lambda x: x`
    Lambda,
    /// `x for x in y`
    Comprehension,
    /// `a and b`, `not a`, `a is b`
    BooleanLogic,
    /// `import`, `def`, `return`, ...
    Statement,
    /// `a: b`, `x @ y`, `\`
    Operator,
}

/// Reasons a formula text is rejected before it is ever evaluated.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParseError {
    /// The text spans more than one line.
    #[error("formula must be a single line")]
    Multiline,

    /// The text contains a comment marker.
    #[error("comment marker at byte {position}")]
    Comment { position: usize },

    /// The text exceeds the configured length limit.
    #[error("formula is {len} bytes long, limit is {max}")]
    TooLong { len: usize, max: usize },

    /// The syntax tree exceeds the configured nesting limit.
    #[error("formula nesting exceeds depth {max}")]
    TooDeep { max: usize },

    /// The text uses a construct outside the arithmetic whitelist.
    #[error("{construct} is not allowed (byte {position})")]
    Disallowed {
        construct: Construct,
        position: usize,
    },

    /// A character that has no meaning in a formula.
    #[error("unexpected character {ch:?} at byte {position}")]
    UnexpectedCharacter { ch: char, position: usize },

    /// A numeric literal that cannot be read as a real number.
    #[error("malformed number {text:?} at byte {position}")]
    MalformedNumber { text: String, position: usize },

    /// A well-formed token in a place the grammar does not allow.
    #[error("unexpected {found} at byte {position}")]
    UnexpectedToken { found: String, position: usize },

    /// The text ended in the middle of an expression.
    #[error("unexpected end of formula")]
    UnexpectedEnd,
}

// ============================================================================
// Evaluation Errors
// ============================================================================

/// Runtime failures inside an otherwise valid formula.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EvalError {
    /// Right-hand side of `/`, `//`, `%` (or a zero base raised to a negative
    /// power) is zero.
    #[error("division by zero in `{operator}`")]
    DivisionByZero { operator: BinaryOp },

    /// A whitelisted function was called outside its real-valued domain.
    #[error("math domain error in {function}()")]
    Domain { function: String },

    /// The called name is not on the function whitelist.
    #[error("unknown function {name}()")]
    UnknownFunction { name: String },

    /// A whitelisted function was called with the wrong number of arguments.
    #[error("{name}() takes {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: String,
        found: usize,
    },

    /// A free variable has no value in the supplied bindings.
    #[error("unbound variable {name}")]
    UnboundVariable { name: String },

    /// A bitwise operator received a value with a fractional part.
    #[error("`{operator}` requires integral operands")]
    NonIntegral { operator: String },

    /// A shift count is negative or the shifted value overflows.
    #[error("invalid shift in `{operator}`")]
    InvalidShift { operator: BinaryOp },

    /// The result is infinite or not a number.
    #[error("result is not a finite number")]
    NonFinite,
}

// ============================================================================
// Formula Errors
// ============================================================================

/// Error surfaced by the sandbox's public API.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FormulaError {
    /// The formula text was rejected at parse time; nothing was compiled.
    #[error("formula `{expression}` rejected: {reason}")]
    ParseRejected {
        expression: String,
        reason: ParseError,
    },

    /// The formula compiled but failed while evaluating `sub_expression`.
    #[error("formula `{expression}` failed at `{sub_expression}`: {reason}")]
    EvalFailed {
        expression: String,
        sub_expression: String,
        reason: EvalError,
    },
}

impl FormulaError {
    /// Original formula text.
    pub fn expression(&self) -> &str {
        match self {
            Self::ParseRejected { expression, .. } | Self::EvalFailed { expression, .. } => {
                expression
            }
        }
    }

    /// Returns true if the formula never compiled.
    pub fn is_parse_rejection(&self) -> bool {
        matches!(self, Self::ParseRejected { .. })
    }
}
