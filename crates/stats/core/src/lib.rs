//! Data-driven statistic aggregation.
//!
//! `stats-core` computes an entity's derived statistics from base values plus
//! the properties of every attached [`Enhancer`]. Properties combine by their
//! [`FactorKind`]; custom properties carry a sandboxed [`stat_formula`]
//! expression that sees the other kinds' aggregates and the entity's keyword
//! counts. All state lives in [`Entity`], and every query recomputes from it.
//!
//! The secondary [`bonus`] module tracks named bonuses that enhance each other
//! through a graph wired from [`BonusCatalog`] metadata.
//!
//! ```
//! use std::sync::Arc;
//! use stats_core::{Enhancer, Entity, Property, Rounding, Statistic};
//!
//! let mut entity = Entity::new();
//! entity.register_statistic(Statistic::new("MILITARY", 2.0)).unwrap();
//! entity
//!     .register_statistic(Statistic::new("DODGE", 0.0).with_rounding(Rounding::Exact))
//!     .unwrap();
//! entity
//!     .attach_enhancer(Arc::new(Enhancer::new(
//!         "Cloak",
//!         [
//!             Property::multiplicative("MILITARY", 2.0),
//!             Property::additive_multiplicatively("DODGE", 0.25),
//!             Property::additive_multiplicatively("DODGE", 0.25),
//!         ],
//!     )))
//!     .unwrap();
//!
//! let snapshot = entity.statistics().unwrap();
//! assert_eq!(snapshot.value("MILITARY"), Some(4.0));
//! assert_eq!(snapshot.value("DODGE"), Some(0.3125));
//! ```
pub mod aggregate;
pub mod bonus;
pub mod config;
pub mod enhancer;
pub mod entity;
pub mod error;
pub mod keywords;
pub mod statistic;

pub use aggregate::{Aggregates, AggregationError, compute};
pub use bonus::{
    Bonus, BonusCatalog, BonusError, BonusGraph, BonusId, BonusMetadata, BonusModifier,
};
pub use config::EngineConfig;
pub use enhancer::{Enhancer, FactorKind, Property};
pub use entity::{Entity, EntityError, StatisticsSnapshot};
pub use error::{EngineError, ErrorSeverity};
pub use keywords::{KeywordCounter, KeywordLookup};
pub use statistic::{ActualStatistic, Rounding, Statistic};

pub use stat_formula::{Formula, FormulaError, ParseLimits};
