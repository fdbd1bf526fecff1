//! Enhancers and their properties.
//!
//! An [`Enhancer`] is a named bundle of [`Property`] modifiers (equipment,
//! perks, cards...). Enhancers are immutable once built and are shared between
//! entities by `Arc`, so attaching one never copies its properties.

use std::collections::BTreeMap;

use stat_formula::{Formula, ParseLimits};

use crate::aggregate::AggregationError;
use crate::keywords::KeywordLookup;

/// Combination rule a property uses.
///
/// | Kind                        | Combination                                   |
/// |-----------------------------|-----------------------------------------------|
/// | `Additive`                  | summed                                        |
/// | `Multiplicative`            | summed, applied as `max(1, sum)`              |
/// | `AdditiveMultiplicatively`  | ascending fold `acc + acc * v` (diminishing)  |
/// | `Custom`                    | formula over the other kinds' aggregates      |
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[strum(serialize_all = "kebab-case")]
pub enum FactorKind {
    Additive,
    Multiplicative,
    AdditiveMultiplicatively,
    Custom,
}

/// A single modifier targeting one statistic.
///
/// Which fields matter is decided by [`FactorKind`]: `value` and `depends_on`
/// for every kind except `Custom`, `formula` only for `Custom`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Property {
    statistic: String,
    #[cfg_attr(feature = "serde", serde(default))]
    value: f64,
    factor: FactorKind,
    #[cfg_attr(
        feature = "serde",
        serde(default, alias = "depends_on_keyword", skip_serializing_if = "Option::is_none")
    )]
    depends_on: Option<String>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    formula: Option<String>,
}

impl Property {
    pub fn new(statistic: impl Into<String>, value: f64, factor: FactorKind) -> Self {
        Self {
            statistic: statistic.into(),
            value,
            factor,
            depends_on: None,
            formula: None,
        }
    }

    pub fn additive(statistic: impl Into<String>, value: f64) -> Self {
        Self::new(statistic, value, FactorKind::Additive)
    }

    pub fn multiplicative(statistic: impl Into<String>, value: f64) -> Self {
        Self::new(statistic, value, FactorKind::Multiplicative)
    }

    pub fn additive_multiplicatively(statistic: impl Into<String>, value: f64) -> Self {
        Self::new(statistic, value, FactorKind::AdditiveMultiplicatively)
    }

    pub fn custom(statistic: impl Into<String>, formula: impl Into<String>) -> Self {
        Self {
            formula: Some(formula.into()),
            ..Self::new(statistic, 0.0, FactorKind::Custom)
        }
    }

    /// Scales the magnitude by the current count of `keyword`.
    #[must_use]
    pub fn depending_on(mut self, keyword: impl Into<String>) -> Self {
        self.depends_on = Some(keyword.into());
        self
    }

    pub fn statistic(&self) -> &str {
        &self.statistic
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn factor(&self) -> FactorKind {
        self.factor
    }

    pub fn depends_on(&self) -> Option<&str> {
        self.depends_on.as_deref()
    }

    pub fn formula(&self) -> Option<&str> {
        self.formula.as_deref()
    }

    /// Stated value, times the `depends_on` keyword's count if one is named.
    pub fn effective_magnitude(&self, keywords: &impl KeywordLookup) -> f64 {
        match &self.depends_on {
            Some(keyword) => self.value * keywords.keyword_count(keyword),
            None => self.value,
        }
    }

    /// Parses this property's formula. Only meaningful for `Custom`.
    pub(crate) fn compile(&self, limits: &ParseLimits) -> Result<Formula, AggregationError> {
        let source = self
            .formula
            .as_deref()
            .ok_or_else(|| AggregationError::MissingFormula {
                statistic: self.statistic.clone(),
            })?;
        Formula::parse_with_limits(source, limits).map_err(|source| AggregationError::Formula {
            statistic: self.statistic.clone(),
            source,
        })
    }
}

/// A named, described bundle of properties grouped by target statistic.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "EnhancerRecord", into = "EnhancerRecord")
)]
pub struct Enhancer {
    name: String,
    description: Option<String>,
    properties: BTreeMap<String, Vec<Property>>,
}

impl Enhancer {
    pub fn new(name: impl Into<String>, properties: impl IntoIterator<Item = Property>) -> Self {
        let mut grouped: BTreeMap<String, Vec<Property>> = BTreeMap::new();
        for property in properties {
            grouped
                .entry(property.statistic.clone())
                .or_default()
                .push(property);
        }
        Self {
            name: name.into(),
            description: None,
            properties: grouped,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Properties targeting `statistic`, in declaration order.
    pub fn properties_for(&self, statistic: &str) -> &[Property] {
        self.properties
            .get(statistic)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every property with its target statistic name.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.properties
            .iter()
            .flat_map(|(name, props)| props.iter().map(move |p| (name.as_str(), p)))
    }

    /// Names of the statistics this enhancer modifies.
    pub fn statistics(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Parses every custom formula so bad content is caught at load time.
    pub fn validate_formulas(&self, limits: &ParseLimits) -> Result<(), AggregationError> {
        self.properties()
            .filter(|(_, property)| property.factor == FactorKind::Custom)
            .try_for_each(|(_, property)| property.compile(limits).map(drop))
    }
}

#[cfg(feature = "serde")]
#[derive(Clone, serde::Serialize, serde::Deserialize)]
struct EnhancerRecord {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    properties: Vec<Property>,
}

#[cfg(feature = "serde")]
impl From<EnhancerRecord> for Enhancer {
    fn from(record: EnhancerRecord) -> Self {
        let enhancer = Enhancer::new(record.name, record.properties);
        match record.description {
            Some(description) => enhancer.with_description(description),
            None => enhancer,
        }
    }
}

#[cfg(feature = "serde")]
impl From<Enhancer> for EnhancerRecord {
    fn from(enhancer: Enhancer) -> Self {
        Self {
            name: enhancer.name,
            description: enhancer.description,
            properties: enhancer.properties.into_values().flatten().collect(),
        }
    }
}
