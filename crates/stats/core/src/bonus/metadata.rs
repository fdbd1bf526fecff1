//! Externally supplied bonus metadata.

use std::collections::BTreeMap;

/// How one bonus is wired and scaled.
///
/// `enhances` lists the bonuses this one feeds into; `enhanced_by` is the
/// older, inverted form naming a single bonus that feeds into this one. Both
/// may be present.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BonusMetadata {
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Vec::is_empty"))]
    pub enhances: Vec<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub enhanced_by: Option<String>,
    /// Keyword whose current count scales this bonus's own value.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub multiplied_by: Option<String>,
    /// Value used when the bonus is added without an explicit one.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub value: Option<f64>,
}

impl BonusMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn enhancing(mut self, target: impl Into<String>) -> Self {
        self.enhances.push(target.into());
        self
    }

    #[must_use]
    pub fn enhanced_by(mut self, source: impl Into<String>) -> Self {
        self.enhanced_by = Some(source.into());
        self
    }

    #[must_use]
    pub fn multiplied_by(mut self, keyword: impl Into<String>) -> Self {
        self.multiplied_by = Some(keyword.into());
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    /// Every bonus name this entry refers to.
    pub(crate) fn neighbours(&self) -> impl Iterator<Item = &str> {
        self.enhances
            .iter()
            .map(String::as_str)
            .chain(self.enhanced_by.as_deref())
    }
}

/// The closed vocabulary of bonus names, with their metadata.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct BonusCatalog {
    entries: BTreeMap<String, BonusMetadata>,
}

impl BonusCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, metadata: BonusMetadata) -> Self {
        self.insert(name, metadata);
        self
    }

    /// Adds or replaces the entry for `name`.
    pub fn insert(&mut self, name: impl Into<String>, metadata: BonusMetadata) -> Option<BonusMetadata> {
        self.entries.insert(name.into(), metadata)
    }

    pub fn get(&self, name: &str) -> Option<&BonusMetadata> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, BonusMetadata)> for BonusCatalog {
    fn from_iter<I: IntoIterator<Item = (N, BonusMetadata)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(name, metadata)| (name.into(), metadata))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbours_cover_both_directions() {
        let metadata = BonusMetadata::new()
            .enhancing("Military")
            .enhancing("Military_vs_Novelty")
            .enhanced_by("Settle_discount");
        assert_eq!(
            metadata.neighbours().collect::<Vec<_>>(),
            ["Military", "Military_vs_Novelty", "Settle_discount"]
        );
    }

    #[test]
    fn catalog_lookup() {
        let catalog: BonusCatalog = [
            ("Military", BonusMetadata::new()),
            ("Military_per_imperium", BonusMetadata::new().multiplied_by("IMPERIUM")),
        ]
        .into_iter()
        .collect();

        assert!(catalog.contains("Military"));
        assert!(!catalog.contains("Draw_card_on_settle"));
        assert_eq!(
            catalog
                .get("Military_per_imperium")
                .and_then(|m| m.multiplied_by.as_deref()),
            Some("IMPERIUM")
        );
        assert_eq!(catalog.len(), 2);
    }
}
