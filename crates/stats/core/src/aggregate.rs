//! Modifier aggregation.
//!
//! Combines every property that targets one statistic into a single value.
//! Non-custom kinds are always folded into four aggregates; custom formulas,
//! when present, receive those aggregates as reserved inputs and produce the
//! final value. Aggregation is read-only: it never touches the statistic or
//! the keyword counter.

use stat_formula::{Bindings, FormulaError, ParseLimits};
use tracing::{debug, trace, warn};

use crate::config::EngineConfig;
use crate::enhancer::{FactorKind, Property};
use crate::error::{EngineError, ErrorSeverity};
use crate::keywords::KeywordLookup;
use crate::statistic::{ActualStatistic, Statistic};

/// Errors raised while computing a statistic.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum AggregationError {
    #[error("formula for statistic '{statistic}' failed: {source}")]
    Formula {
        statistic: String,
        source: FormulaError,
    },

    #[error("custom property for statistic '{statistic}' has no formula")]
    MissingFormula { statistic: String },
}

impl AggregationError {
    pub fn statistic(&self) -> &str {
        match self {
            Self::Formula { statistic, .. } | Self::MissingFormula { statistic } => statistic,
        }
    }
}

impl EngineError for AggregationError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Formula { source, .. } => source.severity(),
            Self::MissingFormula { .. } => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Formula { source, .. } => source.error_code(),
            Self::MissingFormula { .. } => "AGGREGATION_MISSING_FORMULA",
        }
    }
}

/// The four reserved inputs every custom formula sees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aggregates {
    pub base_value: f64,
    /// Sum of additive magnitudes.
    pub additions: f64,
    /// `max(1, sum of multiplicative magnitudes)`.
    pub multiplicators: f64,
    pub additive_multiplicatively: f64,
}

impl Aggregates {
    /// Folds the non-custom properties in `properties` into aggregates.
    pub fn collect<'p>(
        base_value: f64,
        properties: impl IntoIterator<Item = &'p Property>,
        keywords: &impl KeywordLookup,
    ) -> Self {
        let mut additions = 0.0;
        let mut multiplier_sum = 0.0;
        let mut stacked = Vec::new();

        for property in properties {
            if property.factor() == FactorKind::Custom {
                continue;
            }
            let magnitude = property.effective_magnitude(keywords);
            trace!(
                statistic = property.statistic(),
                factor = property.factor().as_ref(),
                magnitude,
                "resolved property"
            );
            match property.factor() {
                FactorKind::Additive => additions += magnitude,
                FactorKind::Multiplicative => multiplier_sum += magnitude,
                FactorKind::AdditiveMultiplicatively => stacked.push(magnitude),
                FactorKind::Custom => {}
            }
        }

        Self {
            base_value,
            additions,
            multiplicators: f64::max(1.0, multiplier_sum),
            additive_multiplicatively: diminishing_stack(stacked),
        }
    }

    /// `base_value * MULTIPLICATORS + ADDITIONS + ADDITIVE_MULTIPLICATIVELY`.
    pub fn combined(&self) -> f64 {
        self.base_value * self.multiplicators + self.additions + self.additive_multiplicatively
    }
}

/// Ascending fold `acc + acc * v`, seeded with the smallest magnitude.
///
/// Order changes the result, so magnitudes are always sorted first.
pub fn diminishing_stack(mut magnitudes: Vec<f64>) -> f64 {
    magnitudes.sort_by(f64::total_cmp);
    let mut iter = magnitudes.into_iter();
    match iter.next() {
        Some(seed) => iter.fold(seed, |acc, v| acc + acc * v),
        None => 0.0,
    }
}

/// Bindings for a custom formula: reserved aggregates first, then keywords.
struct FormulaInputs<'a, K: ?Sized> {
    aggregates: &'a Aggregates,
    keywords: &'a K,
}

impl<K: KeywordLookup + ?Sized> Bindings for FormulaInputs<'_, K> {
    fn lookup(&self, name: &str) -> Option<f64> {
        let value = match name {
            EngineConfig::BASE_VALUE => self.aggregates.base_value,
            EngineConfig::ADDITIONS => self.aggregates.additions,
            EngineConfig::MULTIPLICATORS => self.aggregates.multiplicators,
            EngineConfig::ADDITIVE_MULTIPLICATIVELY => self.aggregates.additive_multiplicatively,
            keyword => self.keywords.keyword_count(keyword),
        };
        Some(value)
    }
}

/// Computes the actual value of `statistic` from the properties targeting it.
///
/// `properties` must be in enhancer-attachment order: when several custom
/// formulas target the statistic, each result overwrites the previous one and
/// only the last is kept.
pub fn compute<K: KeywordLookup + ?Sized>(
    statistic: &Statistic,
    properties: &[&Property],
    keywords: &K,
    limits: &ParseLimits,
) -> Result<ActualStatistic, AggregationError> {
    let aggregates = Aggregates::collect(statistic.base_value(), properties.iter().copied(), &keywords);

    let mut value = aggregates.combined();
    let inputs = FormulaInputs {
        aggregates: &aggregates,
        keywords,
    };
    for property in properties
        .iter()
        .filter(|property| property.factor() == FactorKind::Custom)
    {
        let formula = property.compile(limits)?;
        value = formula.evaluate(&inputs).map_err(|source| {
            warn!(
                statistic = statistic.name(),
                formula = formula.source(),
                error = %source,
                "custom formula failed"
            );
            AggregationError::Formula {
                statistic: statistic.name().to_string(),
                source,
            }
        })?;
    }

    let actual_value = statistic.rounding().apply(value);
    debug!(
        statistic = statistic.name(),
        base_value = statistic.base_value(),
        actual_value,
        properties = properties.len(),
        "computed statistic"
    );

    Ok(ActualStatistic {
        statistic_name: statistic.name().to_string(),
        original_value: statistic.base_value(),
        actual_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::KeywordCounter;
    use crate::statistic::Rounding;
    use proptest::prelude::*;

    fn run(statistic: &Statistic, properties: &[Property], keywords: &KeywordCounter) -> f64 {
        let refs: Vec<&Property> = properties.iter().collect();
        compute(statistic, &refs, keywords, &ParseLimits::default())
            .expect("compute")
            .actual_value
    }

    #[test]
    fn no_modifiers_yields_base_value() {
        let statistic = Statistic::new("MILITARY", 5.4);
        assert_eq!(run(&statistic, &[], &KeywordCounter::new()), 5.0);

        let exact = statistic.with_rounding(Rounding::Exact);
        assert_eq!(run(&exact, &[], &KeywordCounter::new()), 5.4);
    }

    #[test]
    fn multiplicative_magnitudes_are_summed_then_floored_at_one() {
        let statistic = Statistic::new("MILITARY", 3.0);
        let keywords = KeywordCounter::new();

        // 3 * max(1, 2) = 6
        assert_eq!(
            run(&statistic, &[Property::multiplicative("MILITARY", 2.0)], &keywords),
            6.0
        );
        // 3 * max(1, 0.5) = 3
        assert_eq!(
            run(&statistic, &[Property::multiplicative("MILITARY", 0.5)], &keywords),
            3.0
        );
        // 3 * max(1, 1.5 + 1.5) = 9, not 3 * 1.5 * 1.5
        assert_eq!(
            run(
                &statistic,
                &[
                    Property::multiplicative("MILITARY", 1.5),
                    Property::multiplicative("MILITARY", 1.5)
                ],
                &keywords
            ),
            9.0
        );
    }

    #[test]
    fn two_quarter_stacks_give_0_3125() {
        let statistic = Statistic::new("DODGE", 0.0).with_rounding(Rounding::Exact);
        let properties = [
            Property::additive_multiplicatively("DODGE", 0.25),
            Property::additive_multiplicatively("DODGE", 0.25),
        ];
        // 0.25 + 0.25 * 0.25
        assert_eq!(run(&statistic, &properties, &KeywordCounter::new()), 0.3125);
    }

    #[test]
    fn diminishing_stack_is_sorted_ascending() {
        assert_eq!(diminishing_stack(vec![]), 0.0);
        assert_eq!(diminishing_stack(vec![0.4]), 0.4);
        // 0.1 + 0.1 * 0.5, not 0.5 + 0.5 * 0.1
        assert!((diminishing_stack(vec![0.5, 0.1]) - 0.15).abs() < 1e-12);
        assert_eq!(diminishing_stack(vec![0.1, 0.5]), diminishing_stack(vec![0.5, 0.1]));
    }

    #[test]
    fn custom_formula_sees_reserved_inputs_and_keywords() {
        let statistic = Statistic::new("MILITARY", 2.0);
        let mut keywords = KeywordCounter::new();
        keywords.add("SPEED", 7.0).expect("add");
        let properties = [
            Property::multiplicative("MILITARY", 2.0),
            Property::additive("MILITARY", 3.0),
            Property::custom(
                "MILITARY",
                "base_value * MULTIPLICATORS + STAMINA // 3 - SPEED // 5 + ADDITIONS",
            ),
        ];
        // 2 * 2 + 0 // 3 - 7 // 5 + 3
        assert_eq!(run(&statistic, &properties, &keywords), 6.0);
    }

    #[test]
    fn reserved_inputs_shadow_keywords() {
        let statistic = Statistic::new("MILITARY", 2.0);
        let mut keywords = KeywordCounter::new();
        keywords.add("ADDITIONS", 100.0).expect("add");
        let properties = [
            Property::additive("MILITARY", 1.0),
            Property::custom("MILITARY", "ADDITIONS"),
        ];
        assert_eq!(run(&statistic, &properties, &keywords), 1.0);
    }

    #[test]
    fn depends_on_scales_multiplicative_magnitudes() {
        let statistic = Statistic::new("MILITARY", 2.0);
        let mut keywords = KeywordCounter::new();
        keywords.add("IMPERIUM", 3.0).expect("add");
        let properties = [Property::multiplicative("MILITARY", 1.0).depending_on("IMPERIUM")];
        // 2 * max(1, 1 * 3)
        assert_eq!(run(&statistic, &properties, &keywords), 6.0);
    }

    #[test]
    fn depends_on_scales_before_the_diminishing_sort() {
        let statistic = Statistic::new("DODGE", 0.0).with_rounding(Rounding::Exact);
        let mut keywords = KeywordCounter::new();
        keywords.add("CLOAK", 3.0).expect("add");
        let properties = [
            Property::additive_multiplicatively("DODGE", 0.1).depending_on("CLOAK"),
            Property::additive_multiplicatively("DODGE", 0.1),
        ];
        // sorted [0.1, 0.3]: 0.1 + 0.1 * 0.3
        let value = run(&statistic, &properties, &keywords);
        assert!((value - 0.13).abs() < 1e-12, "got {value}");
    }

    #[test]
    fn depends_on_does_not_scale_custom_formulas() {
        let statistic = Statistic::new("MILITARY", 2.0);
        let mut keywords = KeywordCounter::new();
        keywords.add("IMPERIUM", 3.0).expect("add");
        let properties = [Property::custom("MILITARY", "base_value + 1").depending_on("IMPERIUM")];
        assert_eq!(run(&statistic, &properties, &keywords), 3.0);
    }

    #[test]
    fn last_custom_formula_wins() {
        let statistic = Statistic::new("MILITARY", 2.0);
        let properties = [
            Property::custom("MILITARY", "base_value * 10"),
            Property::custom("MILITARY", "base_value + 1"),
        ];
        assert_eq!(run(&statistic, &properties, &KeywordCounter::new()), 3.0);
    }

    #[test]
    fn formula_failure_names_the_statistic() {
        let statistic = Statistic::new("MILITARY", 2.0);
        let property = Property::custom("MILITARY", "base_value / GHOSTS");
        let err = compute(
            &statistic,
            &[&property],
            &KeywordCounter::new(),
            &ParseLimits::default(),
        )
        .expect_err("division by zero");

        assert_eq!(err.statistic(), "MILITARY");
        assert!(err.severity().is_recoverable());
        match err {
            AggregationError::Formula { source, .. } => {
                assert_eq!(source.expression(), "base_value / GHOSTS");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn original_value_is_untouched() {
        let statistic = Statistic::new("MILITARY", 4.0);
        let property = Property::additive("MILITARY", 10.0);
        let actual = compute(
            &statistic,
            &[&property],
            &KeywordCounter::new(),
            &ParseLimits::default(),
        )
        .expect("compute");
        assert_eq!(actual.original_value, 4.0);
        assert_eq!(actual.actual_value, 14.0);
        assert_eq!(statistic.base_value(), 4.0);
    }

    proptest! {
        #[test]
        fn multiplier_never_reduces_a_non_negative_base(
            base in 0.0f64..1_000.0,
            magnitudes in prop::collection::vec(0.0f64..3.0, 0..6),
        ) {
            let statistic = Statistic::new("S", base).with_rounding(Rounding::Exact);
            let properties: Vec<Property> = magnitudes
                .iter()
                .map(|m| Property::multiplicative("S", *m))
                .collect();
            let sum: f64 = magnitudes.iter().sum();
            let value = run(&statistic, &properties, &KeywordCounter::new());

            prop_assert!(value >= base);
            prop_assert_eq!(value, base * f64::max(1.0, sum));
        }

        #[test]
        fn diminishing_stack_ignores_input_order(
            mut magnitudes in prop::collection::vec(0.0f64..1.0, 0..6),
        ) {
            let forward = diminishing_stack(magnitudes.clone());
            magnitudes.reverse();
            prop_assert_eq!(forward, diminishing_stack(magnitudes));
        }
    }
}
