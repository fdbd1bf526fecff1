//! Statistics and their computed snapshots.

/// How a computed statistic value is presented.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Rounding {
    /// Round to the nearest integer, ties to even.
    #[default]
    Nearest,
    /// Keep the real-valued result.
    Exact,
}

impl Rounding {
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Self::Nearest => value.round_ties_even(),
            Self::Exact => value,
        }
    }
}

/// A named numeric attribute of an entity.
///
/// The base value only changes through [`Statistic::increase`]; aggregation
/// reads it but never writes it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Statistic {
    name: String,
    base_value: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    rounding: Rounding,
    #[cfg_attr(feature = "serde", serde(default))]
    description: Option<String>,
}

impl Statistic {
    pub fn new(name: impl Into<String>, base_value: f64) -> Self {
        Self {
            name: name.into(),
            base_value,
            rounding: Rounding::default(),
            description: None,
        }
    }

    #[must_use]
    pub fn with_rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_value(&self) -> f64 {
        self.base_value
    }

    pub fn rounding(&self) -> Rounding {
        self.rounding
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Raises the base value by `amount`.
    pub(crate) fn increase(&mut self, amount: f64) {
        self.base_value += amount;
    }
}

/// Read-only result of aggregating a statistic's modifiers.
///
/// Produced fresh on every query and never cached.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActualStatistic {
    pub statistic_name: String,
    /// The statistic's base value at query time.
    pub original_value: f64,
    /// The aggregated value, rounded per the statistic's policy.
    pub actual_value: f64,
}
