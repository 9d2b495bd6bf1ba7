//! Integration test for the full attribution flow: one seeded journey run
//! through competing models, compared, summarized, and turned into insights.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use searchnav_attribution::insights::InsightGenerator;
use searchnav_attribution::models::{AttributionModel, AttributionTouch, CustomerJourney};
use searchnav_attribution::predictor::FeatureWeightedPredictor;
use searchnav_attribution::AttributionEngine;
use searchnav_core::types::{AttributionModelType, ConversionType, TouchpointType};

fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 10, 9, 30, 0).unwrap()
}

/// Construct the seeded journey: ad click, organic session, direct conversion
/// over 2.25 days at a conversion value of 150.0.
fn sample_journey() -> (CustomerJourney, Vec<AttributionTouch>) {
    let start = start_time();
    let end = start + Duration::hours(54);
    let mut journey = CustomerJourney::new(
        "cust-42",
        start,
        end,
        true,
        150.0,
        AttributionModelType::DataDriven,
    )
    .unwrap();
    journey.conversion_timestamp = Some(end);
    journey.total_touches = 3;
    journey.first_touch_source = Some("google".to_string());
    journey.first_touch_medium = Some("cpc".to_string());
    journey.last_touch_source = Some("direct".to_string());
    journey.last_touch_medium = Some("(none)".to_string());

    let touches = vec![
        AttributionTouch::new(
            journey.journey_id,
            "cust-42",
            TouchpointType::GoogleAdsClick,
            start,
            0.0,
        )
        .unwrap()
        .with_channel("google", "cpc")
        .with_campaign("brand-search")
        .with_gclid("Cj0KCQiA-flow"),
        AttributionTouch::new(
            journey.journey_id,
            "cust-42",
            TouchpointType::Ga4Session,
            start + Duration::days(1),
            0.0,
        )
        .unwrap()
        .with_channel("google", "organic"),
        AttributionTouch::new(
            journey.journey_id,
            "cust-42",
            TouchpointType::DirectVisit,
            end,
            150.0,
        )
        .unwrap()
        .with_channel("direct", "(none)")
        .as_conversion(ConversionType::Purchase),
    ];
    (journey, touches)
}

#[test]
fn test_full_attribution_flow() {
    let engine =
        AttributionEngine::new().with_predictor(Arc::new(FeatureWeightedPredictor::new(
            HashMap::new(),
        )));
    let (journey, touches) = sample_journey();

    let models = vec![
        AttributionModel::first_touch("first_touch"),
        AttributionModel::last_touch("last_touch"),
        AttributionModel::linear("linear"),
        AttributionModel::time_decay("time_decay", 7.0).unwrap(),
        AttributionModel::position_based("position_based", 0.4, 0.4).unwrap(),
        AttributionModel::data_driven("data_driven", None, 0.5, HashMap::new()).unwrap(),
    ];

    // Stage 1: every model produces a fully allocated result.
    let comparison = engine
        .compare_attribution_models(&journey, &touches, &models)
        .unwrap();
    assert_eq!(comparison.len(), 6);
    for (name, result) in &comparison {
        let weight_sum: f64 = result
            .touch_attributions
            .iter()
            .map(|t| t.attribution_weight)
            .sum();
        assert!((weight_sum - 1.0).abs() < 1e-6, "{name}: {weight_sum}");
        assert!(
            (result.total_attributed_value - 150.0).abs() < 1e-6,
            "{name}"
        );
        assert!(result.attribution_confidence >= 0.0 && result.attribution_confidence <= 1.0);
        assert_eq!(result.touch_attributions.len(), 3);
    }

    // Stage 2: model-specific splits.
    let linear = &comparison["linear"];
    assert!((linear.channel_attribution["google/cpc"] - 50.0).abs() < 1e-9);
    let position = &comparison["position_based"];
    assert!((position.touch_attributions[1].revenue_attributed - 30.0).abs() < 1e-9);
    let first = &comparison["first_touch"];
    assert!((first.channel_attribution["google/cpc"] - 150.0).abs() < 1e-9);

    // Stage 3: portfolio summary over the comparison outputs.
    let results: Vec<_> = comparison.into_values().collect();
    let summary = engine.get_attribution_summary(&results);
    assert_eq!(summary.total_conversions, 6);
    assert!((summary.total_attributed_revenue - 900.0).abs() < 1e-6);
    assert!(!summary.top_channels.is_empty());

    // Stage 4: sequence mining sees one recurring path.
    let sequences = engine.identify_top_converting_sequences(&results, 2);
    assert_eq!(sequences.len(), 1);
    assert_eq!(
        sequences[0].sequence,
        "google_ads_click → ga4_session → direct_visit"
    );
    assert_eq!(sequences[0].occurrences, 6);

    // Stage 5: insights generate without error and metrics blend platforms.
    let generator = InsightGenerator::new();
    let _insights = generator.generate_insights(&summary);
    let metrics = generator.cross_platform_metrics(&results);
    assert!((metrics.blended_total_revenue - 900.0).abs() < 1e-6);
    assert_eq!(metrics.google_ads_touches, 6);
    assert_eq!(metrics.direct_touches, 6);
}

#[test]
fn test_incremental_lift_between_scenario_runs() {
    let engine = AttributionEngine::new();
    let (journey, touches) = sample_journey();

    // Baseline credits only the last touch; current spreads credit linearly,
    // shifting revenue into the paid-search channel.
    let baseline = vec![engine
        .calculate_attribution(&journey, &touches, &AttributionModel::last_touch("last"))
        .unwrap()];
    let current = vec![engine
        .calculate_attribution(&journey, &touches, &AttributionModel::linear("linear"))
        .unwrap()];

    let lift = engine.calculate_incremental_value(&current, &baseline, "google/cpc");
    assert!((lift.current_attributed_revenue - 50.0).abs() < 1e-9);
    assert_eq!(lift.baseline_attributed_revenue, 0.0);
    assert!((lift.incremental_revenue - 50.0).abs() < 1e-9);
    assert!(lift.lift_percentage.is_none());

    let direct = engine.calculate_incremental_value(&current, &baseline, "direct/(none)");
    assert!((direct.baseline_attributed_revenue - 150.0).abs() < 1e-9);
    assert!((direct.incremental_revenue - (-100.0)).abs() < 1e-9);
    assert!((direct.lift_percentage.unwrap() - (-100.0 / 150.0 * 100.0)).abs() < 1e-9);
}
