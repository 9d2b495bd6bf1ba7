//! Data model for the attribution subsystem — journeys, touches, model
//! configuration, and the engine's output records.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use searchnav_core::error::{NavError, NavResult};
use searchnav_core::types::{AttributionModelType, ConversionType, TouchpointType};

pub(crate) const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// One customer's purchase funnel summary for a single analysis window.
///
/// Constructed by the ingestion pipeline once all touches for the window are
/// known; the attribution engine treats it as read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerJourney {
    pub journey_id: Uuid,
    pub customer_id: String,
    pub first_touch: DateTime<Utc>,
    pub last_touch: DateTime<Utc>,
    pub conversion_timestamp: Option<DateTime<Utc>>,
    /// Number of touch records associated with this journey. Must match the
    /// touch slice handed to the engine.
    pub total_touches: u32,
    pub converted: bool,
    pub conversion_value: f64,
    /// Model type recorded when the journey was persisted. Informational.
    pub attribution_model: AttributionModelType,
    pub first_touch_source: Option<String>,
    pub first_touch_medium: Option<String>,
    pub last_touch_source: Option<String>,
    pub last_touch_medium: Option<String>,
}

impl CustomerJourney {
    pub fn new(
        customer_id: impl Into<String>,
        first_touch: DateTime<Utc>,
        last_touch: DateTime<Utc>,
        converted: bool,
        conversion_value: f64,
        attribution_model: AttributionModelType,
    ) -> NavResult<Self> {
        if last_touch < first_touch {
            return Err(NavError::InvalidInput(format!(
                "last_touch {last_touch} precedes first_touch {first_touch}"
            )));
        }
        if conversion_value < 0.0 || !conversion_value.is_finite() {
            return Err(NavError::InvalidInput(format!(
                "conversion_value must be non-negative, got {conversion_value}"
            )));
        }
        Ok(Self {
            journey_id: Uuid::new_v4(),
            customer_id: customer_id.into(),
            first_touch,
            last_touch,
            conversion_timestamp: None,
            total_touches: 0,
            converted,
            conversion_value,
            attribution_model,
            first_touch_source: None,
            first_touch_medium: None,
            last_touch_source: None,
            last_touch_medium: None,
        })
    }

    /// Journey span in fractional days. Derived from the touch window and
    /// never stored, so it stays consistent when the window moves.
    pub fn journey_length_days(&self) -> f64 {
        let millis = (self.last_touch - self.first_touch).num_milliseconds() as f64;
        (millis / MILLIS_PER_DAY).max(0.0)
    }

    /// Move the touch window, preserving the ordering invariant.
    pub fn set_touch_window(
        &mut self,
        first_touch: DateTime<Utc>,
        last_touch: DateTime<Utc>,
    ) -> NavResult<()> {
        if last_touch < first_touch {
            return Err(NavError::InvalidInput(format!(
                "last_touch {last_touch} precedes first_touch {first_touch}"
            )));
        }
        self.first_touch = first_touch;
        self.last_touch = last_touch;
        Ok(())
    }
}

/// One touchpoint event within a journey. Emitted by the ingestion pipeline
/// per raw event; the engine never mutates it — attribution output is written
/// to separate [`TouchAttribution`] records referencing `touch_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionTouch {
    pub touch_id: Uuid,
    pub customer_journey_id: Uuid,
    pub customer_id: String,
    pub touchpoint_type: TouchpointType,
    pub timestamp: DateTime<Utc>,
    pub gclid: Option<String>,
    pub campaign_id: Option<String>,
    pub source: Option<String>,
    pub medium: Option<String>,
    pub device_category: Option<String>,
    pub country: Option<String>,
    pub landing_page: Option<String>,
    pub is_conversion_touch: bool,
    pub conversion_type: Option<ConversionType>,
    pub conversion_value: f64,
}

impl AttributionTouch {
    pub fn new(
        customer_journey_id: Uuid,
        customer_id: impl Into<String>,
        touchpoint_type: TouchpointType,
        timestamp: DateTime<Utc>,
        conversion_value: f64,
    ) -> NavResult<Self> {
        if conversion_value < 0.0 || !conversion_value.is_finite() {
            return Err(NavError::InvalidInput(format!(
                "conversion_value must be non-negative, got {conversion_value}"
            )));
        }
        Ok(Self {
            touch_id: Uuid::new_v4(),
            customer_journey_id,
            customer_id: customer_id.into(),
            touchpoint_type,
            timestamp,
            gclid: None,
            campaign_id: None,
            source: None,
            medium: None,
            device_category: None,
            country: None,
            landing_page: None,
            is_conversion_touch: false,
            conversion_type: None,
            conversion_value,
        })
    }

    /// Attach the acquisition channel for this touch.
    pub fn with_channel(mut self, source: impl Into<String>, medium: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self.medium = Some(medium.into());
        self
    }

    pub fn with_gclid(mut self, gclid: impl Into<String>) -> Self {
        self.gclid = Some(gclid.into());
        self
    }

    pub fn with_campaign(mut self, campaign_id: impl Into<String>) -> Self {
        self.campaign_id = Some(campaign_id.into());
        self
    }

    /// Mark this touch as the one on which the conversion fired.
    pub fn as_conversion(mut self, conversion_type: ConversionType) -> Self {
        self.is_conversion_touch = true;
        self.conversion_type = Some(conversion_type);
        self
    }
}

/// Configuration selecting which weighting algorithm the engine runs and its
/// parameters. Built through the per-variant constructors, which validate
/// composite constraints up front.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionModel {
    pub model_id: Uuid,
    pub model_name: String,
    pub model_type: AttributionModelType,
    pub time_decay_half_life_days: f64,
    pub position_based_first_weight: f64,
    pub position_based_last_weight: f64,
    pub custom_weights: HashMap<TouchpointType, f64>,
    pub ml_model_path: Option<String>,
    pub confidence_threshold: f64,
    pub feature_importance_weights: HashMap<String, f64>,
    /// Journeys longer than this may be truncated or excluded by the caller;
    /// the engine itself does not enforce it.
    pub max_journey_length_days: f64,
    /// When set, non-converting journeys short-circuit to a zero-value result.
    pub require_conversion: bool,
}

impl AttributionModel {
    fn base(model_name: impl Into<String>, model_type: AttributionModelType) -> Self {
        Self {
            model_id: Uuid::new_v4(),
            model_name: model_name.into(),
            model_type,
            time_decay_half_life_days: 7.0,
            position_based_first_weight: 0.4,
            position_based_last_weight: 0.4,
            custom_weights: HashMap::new(),
            ml_model_path: None,
            confidence_threshold: 0.5,
            feature_importance_weights: HashMap::new(),
            max_journey_length_days: 90.0,
            require_conversion: false,
        }
    }

    pub fn first_touch(model_name: impl Into<String>) -> Self {
        Self::base(model_name, AttributionModelType::FirstTouch)
    }

    pub fn last_touch(model_name: impl Into<String>) -> Self {
        Self::base(model_name, AttributionModelType::LastTouch)
    }

    pub fn linear(model_name: impl Into<String>) -> Self {
        Self::base(model_name, AttributionModelType::Linear)
    }

    pub fn time_decay(model_name: impl Into<String>, half_life_days: f64) -> NavResult<Self> {
        let mut model = Self::base(model_name, AttributionModelType::TimeDecay);
        model.time_decay_half_life_days = half_life_days;
        model.validate()?;
        Ok(model)
    }

    pub fn position_based(
        model_name: impl Into<String>,
        first_weight: f64,
        last_weight: f64,
    ) -> NavResult<Self> {
        let mut model = Self::base(model_name, AttributionModelType::PositionBased);
        model.position_based_first_weight = first_weight;
        model.position_based_last_weight = last_weight;
        model.validate()?;
        Ok(model)
    }

    pub fn custom(
        model_name: impl Into<String>,
        weights: HashMap<TouchpointType, f64>,
    ) -> NavResult<Self> {
        let mut model = Self::base(model_name, AttributionModelType::Custom);
        model.custom_weights = weights;
        model.validate()?;
        Ok(model)
    }

    pub fn data_driven(
        model_name: impl Into<String>,
        ml_model_path: Option<String>,
        confidence_threshold: f64,
        feature_importance_weights: HashMap<String, f64>,
    ) -> NavResult<Self> {
        let mut model = Self::base(model_name, AttributionModelType::DataDriven);
        model.ml_model_path = ml_model_path;
        model.confidence_threshold = confidence_threshold;
        model.feature_importance_weights = feature_importance_weights;
        model.validate()?;
        Ok(model)
    }

    pub fn with_require_conversion(mut self, required: bool) -> Self {
        self.require_conversion = required;
        self
    }

    /// Check parameter constraints. Run by every constructor and again by the
    /// engine at dispatch, so a hand-assembled struct cannot bypass the gate.
    pub fn validate(&self) -> NavResult<()> {
        if !(self.time_decay_half_life_days > 0.0) || !self.time_decay_half_life_days.is_finite() {
            return Err(NavError::ModelConfiguration(format!(
                "time_decay_half_life_days must be positive, got {}",
                self.time_decay_half_life_days
            )));
        }
        let first = self.position_based_first_weight;
        let last = self.position_based_last_weight;
        if !(0.0..=1.0).contains(&first) || !(0.0..=1.0).contains(&last) {
            return Err(NavError::ModelConfiguration(format!(
                "position-based weights must lie in [0, 1], got first={first}, last={last}"
            )));
        }
        if first + last > 1.0 {
            return Err(NavError::ModelConfiguration(format!(
                "position-based weights must sum to at most 1.0, got {}",
                first + last
            )));
        }
        for (touchpoint_type, weight) in &self.custom_weights {
            if *weight < 0.0 || !weight.is_finite() {
                return Err(NavError::ModelConfiguration(format!(
                    "custom weight for {touchpoint_type} must be non-negative, got {weight}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(NavError::ModelConfiguration(format!(
                "confidence_threshold must lie in [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if !(self.max_journey_length_days > 0.0) {
            return Err(NavError::ModelConfiguration(format!(
                "max_journey_length_days must be positive, got {}",
                self.max_journey_length_days
            )));
        }
        Ok(())
    }
}

/// Per-touch attribution output. References the source touch by id so
/// downstream consumers can re-associate it; the touch itself is untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TouchAttribution {
    pub touch_id: Uuid,
    pub touchpoint_type: TouchpointType,
    pub timestamp: DateTime<Utc>,
    pub source: Option<String>,
    pub medium: Option<String>,
    pub attribution_weight: f64,
    pub revenue_attributed: f64,
}

/// The engine's output for one `(journey, touches, model)` triple. Produced
/// fresh per call and immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionResult {
    pub result_id: Uuid,
    pub customer_journey_id: Uuid,
    pub customer_id: String,
    pub attribution_model_id: Uuid,
    pub model_type: AttributionModelType,
    pub total_conversion_value: f64,
    pub total_attributed_value: f64,
    pub attribution_confidence: f64,
    /// One record per input touch, in input order.
    pub touch_attributions: Vec<TouchAttribution>,
    /// Attributed revenue keyed by `"source/medium"`.
    pub channel_attribution: HashMap<String, f64>,
    pub computed_at: DateTime<Utc>,
}

impl AttributionResult {
    /// Terminal state for a non-converting journey under a model that
    /// requires conversion. Not an error.
    pub fn zero_value(journey: &CustomerJourney, model: &AttributionModel) -> Self {
        Self {
            result_id: Uuid::new_v4(),
            customer_journey_id: journey.journey_id,
            customer_id: journey.customer_id.clone(),
            attribution_model_id: model.model_id,
            model_type: model.model_type,
            total_conversion_value: 0.0,
            total_attributed_value: 0.0,
            attribution_confidence: 0.0,
            touch_attributions: Vec::new(),
            channel_attribution: HashMap::new(),
            computed_at: Utc::now(),
        }
    }
}
