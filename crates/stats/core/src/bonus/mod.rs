//! Bonus enhancement graph.
//!
//! Bonuses are named values that feed into each other. Unlike keywords the
//! set of bonus names is closed: it is defined by a [`BonusCatalog`] loaded
//! from content data, and adding a name outside it is an error.
//!
//! ```text
//! Military_per_imperium (1 x IMPERIUM) ──enhances──► Military (2)
//!                                                        │
//!                                                  enhances
//!                                                        ▼
//!                                               Military_vs_Novelty (2)
//! ```
//!
//! With `IMPERIUM = 3` the totals above are 3, 5 and 7.

mod graph;
mod metadata;

pub use graph::{Bonus, BonusGraph, BonusId, BonusModifier};
pub use metadata::{BonusCatalog, BonusMetadata};

use crate::error::{EngineError, ErrorSeverity};

/// Errors raised by [`BonusGraph`] operations.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum BonusError {
    #[error("bonus '{name}' is not in the catalog")]
    UnknownBonusName { name: String },

    #[error("bonus '{name}' already exists")]
    DuplicateBonus { name: String },

    #[error("invalid value {value} for bonus '{name}'")]
    InvalidValue { name: String, value: f64 },

    #[error("bonus enhancement cycle: {}", path.join(" -> "))]
    CycleDetected { path: Vec<String> },

    #[error("bonus '{name}' is nested deeper than {max} levels")]
    DepthExceeded { name: String, max: usize },
}

impl EngineError for BonusError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownBonusName { .. } | Self::DuplicateBonus { .. } | Self::InvalidValue { .. } => {
                ErrorSeverity::Validation
            }
            Self::CycleDetected { .. } | Self::DepthExceeded { .. } => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownBonusName { .. } => "BONUS_UNKNOWN_NAME",
            Self::DuplicateBonus { .. } => "BONUS_DUPLICATE",
            Self::InvalidValue { .. } => "BONUS_INVALID_VALUE",
            Self::CycleDetected { .. } => "BONUS_CYCLE_DETECTED",
            Self::DepthExceeded { .. } => "BONUS_DEPTH_EXCEEDED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_lists_the_path() {
        let err = BonusError::CycleDetected {
            path: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "bonus enhancement cycle: A -> B -> A");
        assert!(err.severity().is_internal());
    }

    #[test]
    fn unknown_names_are_content_errors() {
        let err = BonusError::UnknownBonusName {
            name: "Teleport".into(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Validation);
        assert_eq!(err.error_code(), "BONUS_UNKNOWN_NAME");
    }
}
