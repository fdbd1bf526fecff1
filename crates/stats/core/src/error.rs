//! Common error infrastructure for stats-core.
//!
//! Every error type in the crate implements [`EngineError`], which classifies
//! it by [`ErrorSeverity`] and gives it a stable error code. Domain errors live
//! next to the operations that produce them and are collected here so callers
//! have a single import point.
//!
//! # Design Principles
//!
//! - **Type Safety**: Each component has its own error enum
//! - **Rich Context**: Errors carry the statistic, bonus, or formula involved
//! - **Severity Classification**: Bad content data is `Validation`, not `Internal`
//! - **Read-only Failures**: Aggregation errors never leave partial state behind

use stat_formula::FormulaError;

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: The same call may succeed once inputs change
/// - **Validation**: Invalid input or content data, should not retry as-is
/// - **Internal**: Unexpected inconsistency that indicates a bug
/// - **Fatal**: The owning structure can no longer be used
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Examples: division by zero with the current keyword counts
    Recoverable,

    /// Examples: forbidden formula text, unknown bonus name
    Validation,

    /// Examples: bonus graph wired into a cycle
    Internal,

    /// Reserved for unusable state.
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all stats-core errors.
///
/// - All error enums implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait EngineError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// Default implementation uses the error type name.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

impl EngineError for FormulaError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            FormulaError::ParseRejected { .. } => ErrorSeverity::Validation,
            FormulaError::EvalFailed { .. } => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            FormulaError::ParseRejected { .. } => "FORMULA_PARSE_REJECTED",
            FormulaError::EvalFailed { .. } => "FORMULA_EVAL_FAILED",
        }
    }
}

pub use crate::aggregate::AggregationError;
pub use crate::bonus::BonusError;
pub use crate::entity::EntityError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formula_rejections_are_validation_errors() {
        let err = stat_formula::Formula::parse("a = 1").expect_err("assignment");
        assert_eq!(err.severity(), ErrorSeverity::Validation);
        assert_eq!(err.error_code(), "FORMULA_PARSE_REJECTED");
        assert!(!err.severity().is_recoverable());
    }

    #[test]
    fn formula_eval_failures_are_recoverable() {
        let formula = stat_formula::Formula::parse("1 / x").expect("parse");
        let err = formula.evaluate(&[("x", 0.0)]).expect_err("zero");
        assert!(err.severity().is_recoverable());
        assert_eq!(err.error_code(), "FORMULA_EVAL_FAILED");
    }
}
