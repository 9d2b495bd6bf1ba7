//! Core attribution engine — routes a journey and its ordered touches through
//! the configured weighting model, normalizes the credit vector, and rolls the
//! attributed revenue up to channel level.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use searchnav_core::config::AttributionConfig;
use searchnav_core::error::{NavError, NavResult};
use searchnav_core::types::AttributionModelType;

use crate::models::{
    AttributionModel, AttributionResult, AttributionTouch, CustomerJourney, TouchAttribution,
    MILLIS_PER_DAY,
};
use crate::predictor::AttributionWeightPredictor;

/// Stateless attribution engine. Safe for concurrent use: each call reads only
/// its arguments and writes only to a freshly constructed result.
#[derive(Clone)]
pub struct AttributionEngine {
    predictor: Option<Arc<dyn AttributionWeightPredictor>>,
    config: AttributionConfig,
}

impl std::fmt::Debug for AttributionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributionEngine")
            .field("predictor", &self.predictor.as_ref().map(|p| p.predictor_name()))
            .field("config", &self.config)
            .finish()
    }
}

impl Default for AttributionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributionEngine {
    pub fn new() -> Self {
        Self::from_config(AttributionConfig::default())
    }

    pub fn from_config(config: AttributionConfig) -> Self {
        Self {
            predictor: None,
            config,
        }
    }

    /// Attach an ML scoring service for data-driven models. Absence or failure
    /// of the predictor degrades to time-decay weighting, never to an error.
    pub fn with_predictor(mut self, predictor: Arc<dyn AttributionWeightPredictor>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    /// Distribute the journey's conversion value across its touches under the
    /// given model.
    ///
    /// Touches must be sorted by timestamp ascending and share the journey's
    /// `customer_id`; ordering is a caller contract and is not re-checked.
    pub fn calculate_attribution(
        &self,
        journey: &CustomerJourney,
        touches: &[AttributionTouch],
        model: &AttributionModel,
    ) -> NavResult<AttributionResult> {
        if touches.is_empty() {
            return Err(NavError::InvalidInput("No touchpoints provided".to_string()));
        }
        model.validate()?;
        if let Some(touch) = touches
            .iter()
            .find(|t| t.customer_id != journey.customer_id)
        {
            return Err(NavError::InvalidInput(format!(
                "touch {} belongs to customer {}, journey {} belongs to {}",
                touch.touch_id, touch.customer_id, journey.journey_id, journey.customer_id
            )));
        }
        if journey.total_touches != 0 && journey.total_touches as usize != touches.len() {
            return Err(NavError::InvalidInput(format!(
                "journey {} records {} touches but {} were provided",
                journey.journey_id,
                journey.total_touches,
                touches.len()
            )));
        }

        if model.require_conversion && !journey.converted {
            debug!(
                journey_id = %journey.journey_id,
                model = %model.model_name,
                "Journey did not convert, returning zero-value result"
            );
            return Ok(AttributionResult::zero_value(journey, model));
        }

        let raw = self.raw_weights(journey, touches, model);
        let weights = normalize(&raw);

        let weight_sum: f64 = weights.iter().sum();
        if (weight_sum - 1.0).abs() > self.config.weight_sum_tolerance {
            return Err(NavError::Computation(format!(
                "weights sum to {weight_sum} after normalization"
            )));
        }

        let mut touch_attributions = Vec::with_capacity(touches.len());
        let mut channel_attribution: HashMap<String, f64> = HashMap::new();
        let mut total_attributed = 0.0;
        for (touch, weight) in touches.iter().zip(&weights) {
            let revenue = weight * journey.conversion_value;
            if revenue < 0.0 {
                return Err(NavError::Computation(format!(
                    "negative attributed revenue {revenue} for touch {}",
                    touch.touch_id
                )));
            }
            total_attributed += revenue;
            *channel_attribution
                .entry(self.channel_key(touch))
                .or_insert(0.0) += revenue;
            touch_attributions.push(TouchAttribution {
                touch_id: touch.touch_id,
                touchpoint_type: touch.touchpoint_type,
                timestamp: touch.timestamp,
                source: touch.source.clone(),
                medium: touch.medium.clone(),
                attribution_weight: *weight,
                revenue_attributed: revenue,
            });
        }

        Ok(AttributionResult {
            result_id: Uuid::new_v4(),
            customer_journey_id: journey.journey_id,
            customer_id: journey.customer_id.clone(),
            attribution_model_id: model.model_id,
            model_type: model.model_type,
            total_conversion_value: journey.conversion_value,
            total_attributed_value: total_attributed,
            attribution_confidence: self.calculate_confidence(touches),
            touch_attributions,
            channel_attribution,
            computed_at: Utc::now(),
        })
    }

    fn raw_weights(
        &self,
        journey: &CustomerJourney,
        touches: &[AttributionTouch],
        model: &AttributionModel,
    ) -> Vec<f64> {
        let n = touches.len();
        match model.model_type {
            AttributionModelType::FirstTouch => {
                let mut weights = vec![0.0; n];
                weights[0] = 1.0;
                weights
            }
            AttributionModelType::LastTouch => {
                let mut weights = vec![0.0; n];
                weights[n - 1] = 1.0;
                weights
            }
            AttributionModelType::Linear => vec![1.0; n],
            AttributionModelType::TimeDecay => {
                self.time_decay_weights(touches, model.time_decay_half_life_days)
            }
            AttributionModelType::PositionBased => position_based_weights(
                n,
                model.position_based_first_weight,
                model.position_based_last_weight,
            ),
            AttributionModelType::Custom => touches
                .iter()
                .map(|t| {
                    model
                        .custom_weights
                        .get(&t.touchpoint_type)
                        .copied()
                        .unwrap_or(0.0)
                })
                .collect(),
            AttributionModelType::DataDriven => self.data_driven_weights(journey, touches, model),
        }
    }

    /// Raw score `2^(-Δt / half_life)` per touch, Δt measured back from the
    /// last touch so the most recent touch scores 1.0.
    fn time_decay_weights(&self, touches: &[AttributionTouch], half_life_days: f64) -> Vec<f64> {
        let last_ts = touches[touches.len() - 1].timestamp;
        touches
            .iter()
            .map(|t| {
                let delta_days =
                    ((last_ts - t.timestamp).num_milliseconds() as f64 / MILLIS_PER_DAY).max(0.0);
                (0.5f64).powf(delta_days / half_life_days)
            })
            .collect()
    }

    fn data_driven_weights(
        &self,
        journey: &CustomerJourney,
        touches: &[AttributionTouch],
        model: &AttributionModel,
    ) -> Vec<f64> {
        if let Some(predictor) = &self.predictor {
            match predictor.predict_attribution_weights(journey, touches) {
                Ok(weights) if usable_prediction(&weights, touches.len()) => {
                    debug!(
                        predictor = predictor.predictor_name(),
                        journey_id = %journey.journey_id,
                        "Using ML-predicted attribution weights"
                    );
                    return weights;
                }
                Ok(weights) => {
                    warn!(
                        predictor = predictor.predictor_name(),
                        expected = touches.len(),
                        got = weights.len(),
                        "Unusable ML weight vector, falling back to time decay"
                    );
                }
                Err(err) => {
                    warn!(
                        predictor = predictor.predictor_name(),
                        error = %err,
                        "ML weight prediction failed, falling back to time decay"
                    );
                }
            }
        } else {
            debug!("No ML predictor configured, falling back to time decay");
        }

        let half_life = if model.time_decay_half_life_days > 0.0 {
            model.time_decay_half_life_days
        } else {
            self.config.default_half_life_days
        };
        self.time_decay_weights(touches, half_life)
    }

    fn channel_key(&self, touch: &AttributionTouch) -> String {
        let source = touch
            .source
            .as_deref()
            .unwrap_or(&self.config.default_channel);
        let medium = touch
            .medium
            .as_deref()
            .unwrap_or(&self.config.default_channel);
        format!("{source}/{medium}")
    }

    /// Heuristic evidence score in [0, 1]: saturating touch volume, GCLID
    /// match density, and temporal proximity of consecutive touches, with
    /// pairs sharing a GCLID weighted double.
    fn calculate_confidence(&self, touches: &[AttributionTouch]) -> f64 {
        let n = touches.len() as f64;
        let volume = n / (n + 3.0);

        let with_gclid = touches.iter().filter(|t| t.gclid.is_some()).count() as f64;
        let gclid_fraction = with_gclid / n;

        let tightness = if touches.len() < 2 {
            1.0
        } else {
            let mut score = 0.0;
            let mut pair_weight_total = 0.0;
            for pair in touches.windows(2) {
                let gap_days = ((pair[1].timestamp - pair[0].timestamp).num_milliseconds() as f64
                    / MILLIS_PER_DAY)
                    .max(0.0);
                let shared_gclid = matches!(
                    (&pair[0].gclid, &pair[1].gclid),
                    (Some(a), Some(b)) if a == b
                );
                let pair_weight = if shared_gclid { 2.0 } else { 1.0 };
                score += pair_weight * (0.5f64).powf(gap_days / 7.0);
                pair_weight_total += pair_weight;
            }
            score / pair_weight_total
        };

        (0.4 * volume + 0.4 * gclid_fraction + 0.2 * tightness).clamp(0.0, 1.0)
    }
}

/// Scale raw scores so they sum to 1.0. A degenerate all-zero vector spreads
/// credit uniformly instead of dividing by zero.
fn normalize(raw: &[f64]) -> Vec<f64> {
    let sum: f64 = raw.iter().sum();
    if sum <= 0.0 || !sum.is_finite() {
        let n = raw.len() as f64;
        return vec![1.0 / n; raw.len()];
    }
    raw.iter().map(|w| w / sum).collect()
}

fn position_based_weights(n: usize, first_weight: f64, last_weight: f64) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    if n == 2 {
        // No interior touches to absorb the remainder: rescale the two shares
        // proportionally to a full allocation.
        let sum = first_weight + last_weight;
        if sum <= 0.0 {
            return vec![0.5, 0.5];
        }
        return vec![first_weight / sum, last_weight / sum];
    }
    let interior = (1.0 - first_weight - last_weight) / (n - 2) as f64;
    let mut weights = vec![interior; n];
    weights[0] = first_weight;
    weights[n - 1] = last_weight;
    weights
}

fn usable_prediction(weights: &[f64], expected_len: usize) -> bool {
    weights.len() == expected_len
        && weights.iter().all(|w| w.is_finite() && *w >= 0.0)
        && weights.iter().sum::<f64>() > 0.0
}
