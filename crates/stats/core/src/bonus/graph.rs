use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::metadata::{BonusCatalog, BonusMetadata};
use super::BonusError;
use crate::config::EngineConfig;
use crate::keywords::KeywordLookup;

/// Index of a node inside its [`BonusGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BonusId(usize);

/// Transform applied to a bonus's own value before it joins the total.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BonusModifier {
    #[default]
    Identity,
    Scaled(f64),
    /// Multiplies by the keyword's count at query time.
    MultipliedBy(String),
}

impl BonusModifier {
    pub fn apply<K: KeywordLookup + ?Sized>(&self, value: f64, keywords: &K) -> f64 {
        match self {
            Self::Identity => value,
            Self::Scaled(factor) => value * factor,
            Self::MultipliedBy(keyword) => value * keywords.keyword_count(keyword),
        }
    }

    fn from_metadata(metadata: Option<&BonusMetadata>) -> Self {
        metadata
            .and_then(|m| m.multiplied_by.clone())
            .map_or(Self::Identity, Self::MultipliedBy)
    }
}

/// One node of the graph.
#[derive(Clone, Debug, PartialEq)]
pub struct Bonus {
    name: String,
    value: f64,
    modifier: BonusModifier,
    enhanced_by: Vec<BonusId>,
    /// Whether the metadata edges of this node have been wired. Placeholders
    /// are created unwired and get wired when explicitly added.
    wired: bool,
}

impl Bonus {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Own value, before the modifier.
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn modifier(&self) -> &BonusModifier {
        &self.modifier
    }

    pub fn enhanced_by(&self) -> &[BonusId] {
        &self.enhanced_by
    }
}

/// Named bonuses wired by enhancement edges.
///
/// The total of a bonus is its modified own value plus the totals of every
/// bonus enhancing it, recursively. Names are validated against a
/// [`BonusCatalog`] when added through [`BonusGraph::add_bonus`]; an unknown
/// name is an error, unlike keywords.
#[derive(Clone, Debug)]
pub struct BonusGraph {
    catalog: BonusCatalog,
    max_depth: usize,
    nodes: Vec<Bonus>,
    index: BTreeMap<String, BonusId>,
}

impl Default for BonusGraph {
    fn default() -> Self {
        Self::new(BonusCatalog::default())
    }
}

impl BonusGraph {
    pub fn new(catalog: BonusCatalog) -> Self {
        Self::with_config(catalog, &EngineConfig::default())
    }

    pub fn with_config(catalog: BonusCatalog, config: &EngineConfig) -> Self {
        Self {
            catalog,
            max_depth: config.max_bonus_depth,
            nodes: Vec::new(),
            index: BTreeMap::new(),
        }
    }

    pub fn catalog(&self) -> &BonusCatalog {
        &self.catalog
    }

    /// Adds `value` to the bonus `name`, creating and wiring it on first use.
    ///
    /// `None` falls back to the catalog's default value, then 0. Returns the
    /// bonus's new own value. Every name the bonus's metadata refers to must
    /// be in the catalog too; on error the graph is left untouched.
    pub fn add_bonus(&mut self, name: impl AsRef<str>, value: Option<f64>) -> Result<f64, BonusError> {
        let name = name.as_ref();
        let metadata = self
            .catalog
            .get(name)
            .ok_or_else(|| BonusError::UnknownBonusName {
                name: name.to_string(),
            })?;
        if let Some(missing) = metadata.neighbours().find(|n| !self.catalog.contains(n)) {
            return Err(BonusError::UnknownBonusName {
                name: missing.to_string(),
            });
        }
        let value = value.or(metadata.value).unwrap_or(0.0);
        if !value.is_finite() {
            return Err(BonusError::InvalidValue {
                name: name.to_string(),
                value,
            });
        }

        let id = self.ensure(name);
        self.nodes[id.0].value += value;
        if !self.nodes[id.0].wired {
            self.wire(id, name);
        }
        debug!(bonus = name, value, total_own = self.nodes[id.0].value, "added bonus");
        Ok(self.nodes[id.0].value)
    }

    /// Inserts a node without consulting the catalog.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: f64,
        modifier: BonusModifier,
    ) -> Result<BonusId, BonusError> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(BonusError::DuplicateBonus { name });
        }
        if !value.is_finite() {
            return Err(BonusError::InvalidValue { name, value });
        }
        let id = self.push(name, value, modifier);
        self.nodes[id.0].wired = true;
        Ok(id)
    }

    /// Makes `source` feed into `target`.
    pub fn link(&mut self, source: &str, target: &str) -> Result<(), BonusError> {
        let source_id = self.id(source)?;
        let target_id = self.id(target)?;
        self.add_edge(source_id, target_id);
        debug!(source, target, "linked bonuses");
        Ok(())
    }

    /// Total of `name`, or 0 if it was never added.
    ///
    /// Keyword scaling is re-read on every call.
    pub fn total_bonus<K: KeywordLookup + ?Sized>(
        &self,
        name: impl AsRef<str>,
        keywords: &K,
    ) -> Result<f64, BonusError> {
        match self.index.get(name.as_ref()) {
            Some(&id) => self.total(id, keywords, &mut Vec::new(), &mut BTreeMap::new()),
            None => Ok(0.0),
        }
    }

    pub fn bonus(&self, name: &str) -> Option<&Bonus> {
        self.index.get(name).map(|id| &self.nodes[id.0])
    }

    pub fn get(&self, id: BonusId) -> Option<&Bonus> {
        self.nodes.get(id.0)
    }

    /// Names of the bonuses feeding directly into `name`.
    pub fn enhancers_of(&self, name: &str) -> Vec<&str> {
        self.bonus(name)
            .map(|bonus| {
                bonus
                    .enhanced_by
                    .iter()
                    .map(|id| self.nodes[id.0].name.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Totals computed during one query are memoized in `done`, so shared
    /// enhancers are walked once.
    fn total<K: KeywordLookup + ?Sized>(
        &self,
        id: BonusId,
        keywords: &K,
        path: &mut Vec<BonusId>,
        done: &mut BTreeMap<BonusId, f64>,
    ) -> Result<f64, BonusError> {
        if let Some(&total) = done.get(&id) {
            return Ok(total);
        }
        if path.contains(&id) {
            let mut names: Vec<String> = path
                .iter()
                .skip_while(|step| **step != id)
                .map(|step| self.nodes[step.0].name.clone())
                .collect();
            names.push(self.nodes[id.0].name.clone());
            warn!(cycle = ?names, "bonus enhancement cycle");
            return Err(BonusError::CycleDetected { path: names });
        }
        if path.len() >= self.max_depth {
            return Err(BonusError::DepthExceeded {
                name: self.nodes[id.0].name.clone(),
                max: self.max_depth,
            });
        }

        let node = &self.nodes[id.0];
        path.push(id);
        let mut total = node.modifier.apply(node.value, keywords);
        for child in &node.enhanced_by {
            total += self.total(*child, keywords, path, done)?;
        }
        path.pop();
        done.insert(id, total);
        Ok(total)
    }

    fn id(&self, name: &str) -> Result<BonusId, BonusError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| BonusError::UnknownBonusName {
                name: name.to_string(),
            })
    }

    /// Existing node, or an unwired zero-value placeholder.
    fn ensure(&mut self, name: &str) -> BonusId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let modifier = BonusModifier::from_metadata(self.catalog.get(name));
        self.push(name.to_string(), 0.0, modifier)
    }

    fn push(&mut self, name: String, value: f64, modifier: BonusModifier) -> BonusId {
        let id = BonusId(self.nodes.len());
        self.index.insert(name.clone(), id);
        self.nodes.push(Bonus {
            name,
            value,
            modifier,
            enhanced_by: Vec::new(),
            wired: false,
        });
        id
    }

    fn wire(&mut self, id: BonusId, name: &str) {
        let Some(metadata) = self.catalog.get(name).cloned() else {
            return;
        };
        for target in &metadata.enhances {
            let target_id = self.ensure(target);
            self.add_edge(id, target_id);
        }
        if let Some(source) = &metadata.enhanced_by {
            let source_id = self.ensure(source);
            self.add_edge(source_id, id);
        }
        self.nodes[id.0].wired = true;
    }

    /// One edge per pair, however many times it is declared.
    fn add_edge(&mut self, source: BonusId, target: BonusId) {
        let enhanced_by = &mut self.nodes[target.0].enhanced_by;
        if !enhanced_by.contains(&source) {
            enhanced_by.push(source);
        }
    }
}
