use std::sync::Arc;

use stats_core::{
    EngineConfig, EngineError, Enhancer, Entity, EntityError, ErrorSeverity, ParseLimits,
    Property, Rounding, Statistic,
};

fn entity(statistics: impl IntoIterator<Item = Statistic>) -> Entity {
    let mut entity = Entity::new();
    for statistic in statistics {
        entity.register_statistic(statistic).expect("register");
    }
    entity
}

#[derive(strum::AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
enum Keywords {
    Pocket,
    Speed,
}

#[test]
fn uber_bombardier_doubles_military_but_never_reduces() {
    let uber_bombardier = Arc::new(
        Enhancer::new(
            "UberBombardier",
            [
                Property::multiplicative("MILITARY", 2.0),
                Property::multiplicative("DRAW_CARDS_ON_EXPLORE", 0.5),
            ],
        )
        .with_description("Boosts military, but halves the amount of cards you see when exploring"),
    );

    // enhancer attached before the statistics exist
    let mut empire = Entity::new();
    empire.attach_enhancer(uber_bombardier).expect("attach");
    empire
        .register_statistic(Statistic::new("MILITARY", 2.0))
        .expect("register");
    empire
        .register_statistic(Statistic::new("DRAW_CARDS_ON_EXPLORE", 3.0))
        .expect("register");

    let statistics = empire.statistics().expect("query");
    let military = statistics.get("MILITARY").expect("military");
    assert_eq!(military.original_value, 2.0);
    assert_eq!(military.actual_value, 4.0);
    // 3 * max(1, 0.5)
    assert_eq!(statistics.value("DRAW_CARDS_ON_EXPLORE"), Some(3.0));
}

#[test]
fn hylian_shield_adds_and_subtracts() {
    let mut hero = entity([
        Statistic::new("DEFENSE", 5.0),
        Statistic::new("STAMINA", 4.0),
        Statistic::new("SPEED", 4.0),
    ]);
    hero.attach_enhancer(Arc::new(
        Enhancer::new(
            "Hylian Shield",
            [
                Property::additive("DEFENSE", 5.0),
                Property::additive("STAMINA", 2.0),
                Property::additive("SPEED", -2.0),
            ],
        )
        .with_description("Increases you defense and stamina, but reduces your speed"),
    ))
    .expect("attach");

    let statistics = hero.statistics().expect("query");
    assert_eq!(statistics.value("DEFENSE"), Some(10.0));
    assert_eq!(statistics.value("STAMINA"), Some(6.0));
    assert_eq!(statistics.value("SPEED"), Some(2.0));
}

#[test]
fn pocket_master_scales_with_pockets() {
    let mut hercules = entity([Statistic::new("MIGHT", 2.0)]);
    hercules.add_keyword(Keywords::Pocket, 4.0).expect("keyword");
    hercules
        .attach_enhancer(Arc::new(Enhancer::new(
            "Pocket master",
            [
                Property::additive("MIGHT", 1.0),
                Property::additive("MIGHT", 1.0).depending_on(Keywords::Pocket.as_ref()),
            ],
        )))
        .expect("attach");

    // 2 + 1 + 1 * 4
    assert_eq!(hercules.statistic("MIGHT").expect("query").actual_value, 7.0);
}

#[test]
fn custom_formula_combines_aggregates_and_keywords() {
    let mut entity = entity([Statistic::new("MILITARY", 2.0)]);
    entity.add_keyword(Keywords::Speed, 7.0).expect("keyword");
    entity
        .attach_enhancer(Arc::new(Enhancer::new(
            "Warlord",
            [
                Property::multiplicative("MILITARY", 2.0),
                Property::additive("MILITARY", 3.0),
                Property::custom(
                    "MILITARY",
                    "base_value * MULTIPLICATORS + STAMINA // 3 - SPEED // 5 + ADDITIONS",
                ),
            ],
        )))
        .expect("attach");

    // 2 * 2 + 0 - 1 + 3
    let military = entity.statistic("MILITARY").expect("query");
    assert_eq!(military.actual_value, 6.0);
    assert_eq!(military.original_value, 2.0);
}

#[test]
fn later_custom_formula_overwrites_earlier_one() {
    let mut entity = entity([Statistic::new("MILITARY", 2.0)]);
    for (name, formula) in [("First", "base_value * 100"), ("Second", "base_value + 1")] {
        entity
            .attach_enhancer(Arc::new(Enhancer::new(
                name,
                [Property::custom("MILITARY", formula)],
            )))
            .expect("attach");
    }
    assert_eq!(entity.statistic("MILITARY").expect("query").actual_value, 3.0);

    entity.detach_enhancer("Second").expect("attached");
    assert_eq!(entity.statistic("MILITARY").expect("query").actual_value, 200.0);
}

#[test]
fn formulas_read_other_statistics_base_values() {
    let mut player = entity([
        Statistic::new("MILITARY", 0.0),
        Statistic::new("MILITARY VS NOVELTY", 0.0),
    ]);
    player
        .attach_enhancer(Arc::new(Enhancer::new(
            "Novelty doctrine",
            [Property::custom("MILITARY VS NOVELTY", "base_value + MILITARY")],
        )))
        .expect("attach");
    player
        .attach_enhancer(Arc::new(Enhancer::new(
            "Some enhancer",
            [Property::additive("MILITARY", 3.0)],
        )))
        .expect("attach");

    let statistics = player.statistics().expect("query");
    assert_eq!(statistics.value("MILITARY"), Some(3.0));
    // the mirrored keyword tracks the base value, not the aggregated one
    assert_eq!(statistics.value("MILITARY VS NOVELTY"), Some(0.0));

    player.increase_statistic("MILITARY", 2.0).expect("increase");
    let statistics = player.statistics().expect("query");
    assert_eq!(statistics.value("MILITARY"), Some(5.0));
    assert_eq!(statistics.value("MILITARY VS NOVELTY"), Some(2.0));
}

#[test]
fn unmodified_statistics_round_per_policy() {
    let entity = entity([
        Statistic::new("LUCK", 2.5),
        Statistic::new("CRIT", 2.5).with_rounding(Rounding::Exact),
    ]);
    let statistics = entity.statistics().expect("query");
    assert_eq!(statistics.value("LUCK"), Some(2.0));
    assert_eq!(statistics.value("CRIT"), Some(2.5));
}

#[test]
fn repeated_queries_are_identical() {
    let mut entity = entity([
        Statistic::new("MILITARY", 2.0),
        Statistic::new("DODGE", 0.0).with_rounding(Rounding::Exact),
    ]);
    entity
        .attach_enhancer(Arc::new(Enhancer::new(
            "Mixed",
            [
                Property::multiplicative("MILITARY", 1.5),
                Property::additive_multiplicatively("DODGE", 0.1),
                Property::additive_multiplicatively("DODGE", 0.3),
                Property::custom("DODGE", "ADDITIVE_MULTIPLICATIVELY * 2"),
            ],
        )))
        .expect("attach");

    let first = entity.statistics().expect("query");
    let second = entity.statistics().expect("query");
    assert_eq!(first, second);
}

#[test]
fn shared_enhancers_serve_several_entities() {
    let banner = Arc::new(Enhancer::new("Banner", [Property::additive("MORALE", 1.0)]));
    let mut first = entity([Statistic::new("MORALE", 1.0)]);
    let mut second = entity([Statistic::new("MORALE", 10.0)]);
    first.attach_enhancer(Arc::clone(&banner)).expect("attach");
    second.attach_enhancer(Arc::clone(&banner)).expect("attach");

    assert_eq!(Arc::strong_count(&banner), 3);
    assert_eq!(first.statistic("MORALE").expect("query").actual_value, 2.0);
    assert_eq!(second.statistic("MORALE").expect("query").actual_value, 11.0);
}

#[test]
fn sandbox_rejections_surface_as_validation_errors() {
    let mut entity = entity([Statistic::new("MILITARY", 2.0)]);
    entity
        .attach_enhancer(Arc::new(Enhancer::new(
            "Trojan",
            [Property::custom("MILITARY", "os.system('x')")],
        )))
        .expect("attach");

    let err = entity.statistics().expect_err("rejected");
    assert!(matches!(err, EntityError::Aggregation(_)));
    assert_eq!(err.severity(), ErrorSeverity::Validation);
    assert_eq!(err.error_code(), "FORMULA_PARSE_REJECTED");
}

#[test]
fn formula_limits_come_from_the_entity_config() {
    let config = EngineConfig::new().with_formula_limits(ParseLimits::new().with_max_len(8));
    let mut entity = Entity::with_config(config);
    entity
        .register_statistic(Statistic::new("MILITARY", 2.0))
        .expect("register");
    entity
        .attach_enhancer(Arc::new(Enhancer::new(
            "Verbose",
            [Property::custom("MILITARY", "base_value + 1")],
        )))
        .expect("attach");

    assert!(entity.statistics().is_err());
}
