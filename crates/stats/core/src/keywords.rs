//! Keyword counters.
//!
//! Keywords are an open namespace: any name may be incremented, and a name
//! that was never incremented simply counts zero. Bonus names are different:
//! they form a closed vocabulary (see [`crate::bonus`]).

use std::collections::BTreeMap;

use tracing::trace;

use crate::entity::EntityError;

/// Read access to keyword counts.
///
/// Implemented by [`KeywordCounter`]; the aggregator and the bonus graph only
/// depend on this trait so callers can plug in their own storage.
pub trait KeywordLookup {
    /// Current count for `name`, zero if it was never incremented.
    fn keyword_count(&self, name: &str) -> f64;
}

impl<K: KeywordLookup + ?Sized> KeywordLookup for &K {
    fn keyword_count(&self, name: &str) -> f64 {
        (**self).keyword_count(name)
    }
}

/// Monotonically non-decreasing named counters owned by one entity.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct KeywordCounter {
    counts: BTreeMap<String, f64>,
}

impl KeywordCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments `name` by `amount` and returns the new count.
    ///
    /// `amount` must be finite and non-negative; counters never decrease.
    pub fn add(&mut self, name: impl AsRef<str>, amount: f64) -> Result<f64, EntityError> {
        let name = name.as_ref();
        if !amount.is_finite() || amount < 0.0 {
            return Err(EntityError::InvalidAmount {
                name: name.to_string(),
                amount,
            });
        }

        let count = self.counts.entry(name.to_string()).or_insert(0.0);
        *count += amount;
        trace!(keyword = name, amount, count = *count, "keyword incremented");
        Ok(*count)
    }

    /// Mirrors a statistic's initial base value, which may be negative.
    pub(crate) fn seed(&mut self, name: &str, value: f64) {
        *self.counts.entry(name.to_string()).or_insert(0.0) += value;
    }

    /// Current count for `name`, zero if it was never incremented.
    pub fn count(&self, name: impl AsRef<str>) -> f64 {
        self.counts.get(name.as_ref()).copied().unwrap_or(0.0)
    }

    /// Iterates over every keyword that has been incremented, by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.counts.iter().map(|(name, count)| (name.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl KeywordLookup for KeywordCounter {
    fn keyword_count(&self, name: &str) -> f64 {
        self.count(name)
    }
}
