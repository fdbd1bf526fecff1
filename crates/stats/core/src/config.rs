use stat_formula::ParseLimits;

/// Engine configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Parse cost bounds applied to every custom formula.
    pub formula_limits: ParseLimits,
    /// Maximum enhancement chain length walked when totalling a bonus.
    pub max_bonus_depth: usize,
}

impl EngineConfig {
    // ===== reserved formula inputs =====
    /// The statistic's own, un-aggregated base value.
    pub const BASE_VALUE: &'static str = "base_value";
    /// Sum of additive magnitudes.
    pub const ADDITIONS: &'static str = "ADDITIONS";
    /// `max(1, sum of multiplicative magnitudes)`.
    pub const MULTIPLICATORS: &'static str = "MULTIPLICATORS";
    /// Result of the diminishing additive-multiplicative fold.
    pub const ADDITIVE_MULTIPLICATIVELY: &'static str = "ADDITIVE_MULTIPLICATIVELY";

    /// Names always bound for custom formulas; they shadow keywords.
    pub const RESERVED_INPUTS: [&'static str; 4] = [
        Self::BASE_VALUE,
        Self::ADDITIONS,
        Self::MULTIPLICATORS,
        Self::ADDITIVE_MULTIPLICATIVELY,
    ];

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_MAX_BONUS_DEPTH: usize = 64;

    pub fn new() -> Self {
        Self {
            formula_limits: ParseLimits::new(),
            max_bonus_depth: Self::DEFAULT_MAX_BONUS_DEPTH,
        }
    }

    #[must_use]
    pub fn with_formula_limits(mut self, formula_limits: ParseLimits) -> Self {
        self.formula_limits = formula_limits;
        self
    }

    #[must_use]
    pub fn with_max_bonus_depth(mut self, max_bonus_depth: usize) -> Self {
        self.max_bonus_depth = max_bonus_depth;
        self
    }

    /// Returns true if `name` is one of the reserved formula inputs.
    pub fn is_reserved_input(name: &str) -> bool {
        Self::RESERVED_INPUTS.contains(&name)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
