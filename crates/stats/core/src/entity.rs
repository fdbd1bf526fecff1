//! Entity statistic store.
//!
//! An [`Entity`] owns its statistics, its keyword counter and the list of
//! enhancers attached to it. Nothing derived is stored: every query regroups
//! the attached enhancers' properties and runs them through
//! [`aggregate::compute`](crate::aggregate::compute), so attaching, detaching
//! or raising a base value is visible on the very next query.
//!
//! # Statistics mirror keywords
//!
//! Registering a statistic seeds the keyword of the same name with its base
//! value, and [`Entity::increase_statistic`] increments that keyword by the
//! same delta. Custom formulas rely on this to reference another statistic's
//! base value by name:
//!
//! ```
//! use std::sync::Arc;
//! use stats_core::{Enhancer, Entity, Property, Statistic};
//!
//! let mut entity = Entity::new();
//! entity.register_statistic(Statistic::new("STRENGTH", 4.0)).unwrap();
//! entity.register_statistic(Statistic::new("CARRY", 10.0)).unwrap();
//! entity
//!     .attach_enhancer(Arc::new(Enhancer::new(
//!         "Backpack",
//!         [Property::custom("CARRY", "base_value + STRENGTH * 2")],
//!     )))
//!     .unwrap();
//!
//! assert_eq!(entity.statistic("CARRY").unwrap().actual_value, 18.0);
//! entity.increase_statistic("STRENGTH", 1.0).unwrap();
//! assert_eq!(entity.statistic("CARRY").unwrap().actual_value, 20.0);
//! ```

use std::sync::Arc;

use tracing::debug;

use crate::aggregate::{self, AggregationError};
use crate::config::EngineConfig;
use crate::enhancer::{Enhancer, Property};
use crate::error::{EngineError, ErrorSeverity};
use crate::keywords::KeywordCounter;
use crate::statistic::{ActualStatistic, Statistic};

/// Errors raised by [`Entity`] operations.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum EntityError {
    #[error("statistic '{name}' is not registered")]
    UnknownStatistic { name: String },

    #[error("statistic '{name}' is already registered")]
    DuplicateStatistic { name: String },

    #[error("enhancer '{name}' is already attached")]
    DuplicateEnhancer { name: String },

    #[error("invalid amount {amount} for '{name}': must be finite and non-negative")]
    InvalidAmount { name: String, amount: f64 },

    #[error(transparent)]
    Aggregation(#[from] AggregationError),
}

impl EngineError for EntityError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownStatistic { .. }
            | Self::DuplicateStatistic { .. }
            | Self::DuplicateEnhancer { .. }
            | Self::InvalidAmount { .. } => ErrorSeverity::Validation,
            Self::Aggregation(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownStatistic { .. } => "ENTITY_UNKNOWN_STATISTIC",
            Self::DuplicateStatistic { .. } => "ENTITY_DUPLICATE_STATISTIC",
            Self::DuplicateEnhancer { .. } => "ENTITY_DUPLICATE_ENHANCER",
            Self::InvalidAmount { .. } => "ENTITY_INVALID_AMOUNT",
            Self::Aggregation(err) => err.error_code(),
        }
    }
}

/// Actual statistics of an entity, in registration order.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct StatisticsSnapshot {
    statistics: Vec<ActualStatistic>,
}

impl StatisticsSnapshot {
    pub fn get(&self, name: &str) -> Option<&ActualStatistic> {
        self.statistics.iter().find(|s| s.statistic_name == name)
    }

    /// Shorthand for the actual value of `name`.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.get(name).map(|s| s.actual_value)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, ActualStatistic> {
        self.statistics.iter()
    }

    pub fn len(&self) -> usize {
        self.statistics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statistics.is_empty()
    }
}

impl IntoIterator for StatisticsSnapshot {
    type Item = ActualStatistic;
    type IntoIter = std::vec::IntoIter<ActualStatistic>;

    fn into_iter(self) -> Self::IntoIter {
        self.statistics.into_iter()
    }
}

impl<'a> IntoIterator for &'a StatisticsSnapshot {
    type Item = &'a ActualStatistic;
    type IntoIter = core::slice::Iter<'a, ActualStatistic>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Statistics, keywords and attached enhancers of one entity.
///
/// Not internally synchronized; wrap the whole entity in one lock if it is
/// shared between threads.
#[derive(Clone, Debug, Default)]
pub struct Entity {
    config: EngineConfig,
    statistics: Vec<Statistic>,
    keywords: KeywordCounter,
    enhancers: Vec<Arc<Enhancer>>,
}

impl Entity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ===== statistics =====

    /// Registers a statistic and seeds its mirrored keyword.
    pub fn register_statistic(&mut self, statistic: Statistic) -> Result<(), EntityError> {
        if self.find(statistic.name()).is_some() {
            return Err(EntityError::DuplicateStatistic {
                name: statistic.name().to_string(),
            });
        }
        if !statistic.base_value().is_finite() {
            return Err(EntityError::InvalidAmount {
                name: statistic.name().to_string(),
                amount: statistic.base_value(),
            });
        }

        self.keywords.seed(statistic.name(), statistic.base_value());
        debug!(
            statistic = statistic.name(),
            base_value = statistic.base_value(),
            rounding = %statistic.rounding(),
            "registered statistic"
        );
        self.statistics.push(statistic);
        Ok(())
    }

    /// Raises the base value of `name` by `delta` and returns the new base.
    ///
    /// The mirrored keyword is incremented by the same delta.
    pub fn increase_statistic(&mut self, name: &str, delta: f64) -> Result<f64, EntityError> {
        let index = self
            .find(name)
            .ok_or_else(|| EntityError::UnknownStatistic {
                name: name.to_string(),
            })?;

        self.keywords.add(name, delta)?;
        let statistic = &mut self.statistics[index];
        statistic.increase(delta);
        debug!(statistic = name, delta, base_value = statistic.base_value(), "increased statistic");
        Ok(statistic.base_value())
    }

    /// The registered (un-aggregated) statistic named `name`.
    pub fn base_statistic(&self, name: &str) -> Option<&Statistic> {
        self.find(name).map(|index| &self.statistics[index])
    }

    /// Registered statistics, in registration order.
    pub fn base_statistics(&self) -> &[Statistic] {
        &self.statistics
    }

    // ===== enhancers =====

    /// Attaches a shared enhancer. Attachment order decides which custom
    /// formula wins when several target the same statistic.
    pub fn attach_enhancer(&mut self, enhancer: Arc<Enhancer>) -> Result<(), EntityError> {
        if self.enhancers.iter().any(|e| e.name() == enhancer.name()) {
            return Err(EntityError::DuplicateEnhancer {
                name: enhancer.name().to_string(),
            });
        }
        debug!(enhancer = enhancer.name(), "attached enhancer");
        self.enhancers.push(enhancer);
        Ok(())
    }

    /// Detaches the enhancer named `name`, returning it if it was attached.
    pub fn detach_enhancer(&mut self, name: &str) -> Option<Arc<Enhancer>> {
        let index = self.enhancers.iter().position(|e| e.name() == name)?;
        debug!(enhancer = name, "detached enhancer");
        Some(self.enhancers.remove(index))
    }

    pub fn enhancers(&self) -> impl Iterator<Item = &Arc<Enhancer>> {
        self.enhancers.iter()
    }

    // ===== keywords =====

    pub fn add_keyword(&mut self, name: impl AsRef<str>, amount: f64) -> Result<f64, EntityError> {
        self.keywords.add(name, amount)
    }

    pub fn keyword_count(&self, name: impl AsRef<str>) -> f64 {
        self.keywords.count(name)
    }

    pub fn keywords(&self) -> &KeywordCounter {
        &self.keywords
    }

    // ===== queries =====

    /// Computes every registered statistic.
    ///
    /// Properties targeting a statistic that is not registered are ignored.
    pub fn statistics(&self) -> Result<StatisticsSnapshot, EntityError> {
        let statistics = self
            .statistics
            .iter()
            .map(|statistic| self.compute(statistic))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(StatisticsSnapshot { statistics })
    }

    /// Computes the single statistic `name`.
    pub fn statistic(&self, name: &str) -> Result<ActualStatistic, EntityError> {
        let statistic = self
            .base_statistic(name)
            .ok_or_else(|| EntityError::UnknownStatistic {
                name: name.to_string(),
            })?;
        self.compute(statistic)
    }

    fn compute(&self, statistic: &Statistic) -> Result<ActualStatistic, EntityError> {
        let properties: Vec<&Property> = self
            .enhancers
            .iter()
            .flat_map(|enhancer| enhancer.properties_for(statistic.name()))
            .collect();
        Ok(aggregate::compute(
            statistic,
            &properties,
            &self.keywords,
            &self.config.formula_limits,
        )?)
    }

    fn find(&self, name: &str) -> Option<usize> {
        self.statistics.iter().position(|s| s.name() == name)
    }
}
