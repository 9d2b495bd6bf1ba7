//! Scoring-service abstraction for data-driven attribution.
//!
//! External ML services implement [`AttributionWeightPredictor`], allowing the
//! engine to be decoupled from how weights are produced. The engine treats any
//! predictor failure as recoverable and falls back to time-decay weighting.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AttributionTouch, CustomerJourney, MILLIS_PER_DAY};

/// One raw (not necessarily normalized) weight per touch, in input order.
/// The engine normalizes the returned vector itself.
pub trait AttributionWeightPredictor: Send + Sync {
    fn predict_attribution_weights(
        &self,
        journey: &CustomerJourney,
        touches: &[AttributionTouch],
    ) -> Result<Vec<f64>, PredictorError>;

    /// Predictor name for logging.
    fn predictor_name(&self) -> &str;
}

/// Errors a scoring service can surface. None of these propagate to
/// attribution callers; the engine logs and falls back.
#[derive(Error, Debug)]
pub enum PredictorError {
    #[error("model not loaded: {0}")]
    ModelNotLoaded(String),

    #[error("malformed output: expected {expected} weights, got {got}")]
    MalformedOutput { expected: usize, got: usize },

    #[error("prediction timed out after {0}ms")]
    Timeout(u64),

    #[error("prediction failure: {0}")]
    Failure(String),
}

/// Metadata describing a trained attribution model, supplied by the ML
/// pipeline alongside its predictor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlModelInfo {
    pub model_id: Uuid,
    pub model_path: String,
    pub version: String,
    pub trained_at: Option<DateTime<Utc>>,
    pub validation_score: f64,
}

/// Deterministic in-process predictor scoring each touch from configured
/// feature-importance weights. Serves as the reference backend; production
/// scoring services implement the same trait out of tree.
///
/// Recognized features: `recency`, `position`, `has_gclid`,
/// `is_conversion_touch`. Unknown keys are ignored.
pub struct FeatureWeightedPredictor {
    feature_weights: HashMap<String, f64>,
    info: MlModelInfo,
}

impl FeatureWeightedPredictor {
    pub fn new(feature_weights: HashMap<String, f64>) -> Self {
        let feature_weights = if feature_weights.is_empty() {
            Self::default_weights()
        } else {
            feature_weights
        };
        Self {
            feature_weights,
            info: MlModelInfo {
                model_id: Uuid::new_v4(),
                model_path: "builtin://feature-weighted".to_string(),
                version: "1".to_string(),
                trained_at: None,
                validation_score: 0.0,
            },
        }
    }

    fn default_weights() -> HashMap<String, f64> {
        let mut weights = HashMap::new();
        weights.insert("recency".to_string(), 0.4);
        weights.insert("position".to_string(), 0.2);
        weights.insert("has_gclid".to_string(), 0.3);
        weights.insert("is_conversion_touch".to_string(), 0.1);
        weights
    }

    pub fn model_info(&self) -> &MlModelInfo {
        &self.info
    }

    fn feature_weight(&self, name: &str) -> f64 {
        self.feature_weights.get(name).copied().unwrap_or(0.0)
    }
}

impl AttributionWeightPredictor for FeatureWeightedPredictor {
    fn predict_attribution_weights(
        &self,
        journey: &CustomerJourney,
        touches: &[AttributionTouch],
    ) -> Result<Vec<f64>, PredictorError> {
        if touches.is_empty() {
            return Err(PredictorError::MalformedOutput {
                expected: 1,
                got: 0,
            });
        }

        let n = touches.len();
        let span_days = journey.journey_length_days().max(f64::EPSILON);
        let last_ts = touches[n - 1].timestamp;

        let scores = touches
            .iter()
            .enumerate()
            .map(|(i, touch)| {
                let age_days = ((last_ts - touch.timestamp).num_milliseconds() as f64
                    / MILLIS_PER_DAY)
                    .max(0.0);
                let recency = 1.0 - (age_days / span_days).min(1.0);
                let position = if n == 1 {
                    1.0
                } else {
                    i as f64 / (n - 1) as f64
                };
                let has_gclid = if touch.gclid.is_some() { 1.0 } else { 0.0 };
                let is_conversion = if touch.is_conversion_touch { 1.0 } else { 0.0 };

                // Floor keeps every touch in play so the vector never
                // collapses to zero mass.
                0.01 + self.feature_weight("recency") * recency
                    + self.feature_weight("position") * position
                    + self.feature_weight("has_gclid") * has_gclid
                    + self.feature_weight("is_conversion_touch") * is_conversion
            })
            .collect();

        Ok(scores)
    }

    fn predictor_name(&self) -> &str {
        "feature_weighted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use searchnav_core::types::{AttributionModelType, ConversionType, TouchpointType};

    fn sample() -> (CustomerJourney, Vec<AttributionTouch>) {
        let start = Utc::now();
        let end = start + Duration::days(3);
        let journey = CustomerJourney::new(
            "cust-9",
            start,
            end,
            true,
            80.0,
            AttributionModelType::DataDriven,
        )
        .unwrap();
        let touches = vec![
            AttributionTouch::new(
                journey.journey_id,
                "cust-9",
                TouchpointType::GoogleAdsClick,
                start,
                0.0,
            )
            .unwrap()
            .with_gclid("g-1"),
            AttributionTouch::new(
                journey.journey_id,
                "cust-9",
                TouchpointType::DirectVisit,
                end,
                80.0,
            )
            .unwrap()
            .as_conversion(ConversionType::Purchase),
        ];
        (journey, touches)
    }

    #[test]
    fn test_scores_match_touch_count_and_are_positive() {
        let predictor = FeatureWeightedPredictor::new(HashMap::new());
        let (journey, touches) = sample();
        let scores = predictor
            .predict_attribution_weights(&journey, &touches)
            .unwrap();
        assert_eq!(scores.len(), touches.len());
        assert!(scores.iter().all(|s| *s > 0.0));
    }

    #[test]
    fn test_conversion_touch_scores_highest_with_defaults() {
        let predictor = FeatureWeightedPredictor::new(HashMap::new());
        let (journey, touches) = sample();
        let scores = predictor
            .predict_attribution_weights(&journey, &touches)
            .unwrap();
        // Last touch is both most recent and the conversion touch.
        assert!(scores[1] > scores[0]);
    }

    #[test]
    fn test_empty_touch_list_is_malformed() {
        let predictor = FeatureWeightedPredictor::new(HashMap::new());
        let (journey, _) = sample();
        assert!(predictor
            .predict_attribution_weights(&journey, &[])
            .is_err());
    }
}
