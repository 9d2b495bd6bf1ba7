//! Multi-touch attribution — reconstructs customer journeys from timestamped
//! touchpoints and distributes conversion credit under competing weighting
//! models.

pub mod analytics;
pub mod engine;
pub mod insights;
pub mod models;
pub mod predictor;

pub use analytics::{AttributionSummary, ConvertingSequence, IncrementalValue};
pub use engine::AttributionEngine;
pub use insights::InsightGenerator;
pub use models::{
    AttributionModel, AttributionResult, AttributionTouch, CustomerJourney, TouchAttribution,
};
pub use predictor::{AttributionWeightPredictor, FeatureWeightedPredictor, PredictorError};
