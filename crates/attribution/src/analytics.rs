//! Cross-result analytics — model comparison, incremental lift, converting
//! sequence mining, and portfolio summaries over attribution results.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use searchnav_core::error::NavResult;

use crate::engine::AttributionEngine;
use crate::models::{AttributionModel, AttributionResult, AttributionTouch, CustomerJourney};

/// Incremental revenue of one channel between two attribution runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncrementalValue {
    pub channel: String,
    pub current_attributed_revenue: f64,
    pub baseline_attributed_revenue: f64,
    pub incremental_revenue: f64,
    /// `None` when the baseline total is zero — lift is undefined there.
    pub lift_percentage: Option<f64>,
}

/// A recurring touchpoint path across converting journeys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertingSequence {
    pub sequence: String,
    pub occurrences: u64,
    pub total_revenue: f64,
}

/// Per-channel rollup inside an [`AttributionSummary`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub revenue: f64,
    pub conversions: u64,
}

/// Channel entry in the top-channels ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelRevenue {
    pub channel: String,
    pub revenue: f64,
}

/// Aggregate view over a batch of attribution results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionSummary {
    pub total_conversions: u64,
    pub total_attributed_revenue: f64,
    pub average_confidence: f64,
    pub channels: HashMap<String, ChannelSummary>,
    /// Channels ranked by summed revenue, descending.
    pub top_channels: Vec<ChannelRevenue>,
    pub generated_at: DateTime<Utc>,
}

impl AttributionEngine {
    /// Run every supplied model against the identical `(journey, touches)`
    /// pair. Keyed by `model_name`; duplicate names overwrite earlier entries
    /// (last write wins).
    pub fn compare_attribution_models(
        &self,
        journey: &CustomerJourney,
        touches: &[AttributionTouch],
        models: &[AttributionModel],
    ) -> NavResult<HashMap<String, AttributionResult>> {
        let mut results = HashMap::with_capacity(models.len());
        for model in models {
            let result = self.calculate_attribution(journey, touches, model)?;
            results.insert(model.model_name.clone(), result);
        }
        Ok(results)
    }

    /// Compare one channel's attributed revenue between two result sets.
    /// Results that never saw the channel contribute zero.
    pub fn calculate_incremental_value(
        &self,
        current_results: &[AttributionResult],
        baseline_results: &[AttributionResult],
        channel: &str,
    ) -> IncrementalValue {
        let current_total = channel_total(current_results, channel);
        let baseline_total = channel_total(baseline_results, channel);
        let incremental = current_total - baseline_total;
        let lift_percentage = if baseline_total != 0.0 {
            Some(incremental / baseline_total * 100.0)
        } else {
            None
        };

        IncrementalValue {
            channel: channel.to_string(),
            current_attributed_revenue: current_total,
            baseline_attributed_revenue: baseline_total,
            incremental_revenue: incremental,
            lift_percentage,
        }
    }

    /// Group results by their ordered touchpoint-type path and keep paths
    /// seen at least `min_occurrences` times. Sorted by occurrence count
    /// descending, ties broken by total revenue descending.
    pub fn identify_top_converting_sequences(
        &self,
        results: &[AttributionResult],
        min_occurrences: u64,
    ) -> Vec<ConvertingSequence> {
        let mut groups: HashMap<String, (u64, f64)> = HashMap::new();
        for result in results {
            if result.touch_attributions.is_empty() {
                continue;
            }
            let key = result
                .touch_attributions
                .iter()
                .map(|t| t.touchpoint_type.label())
                .collect::<Vec<_>>()
                .join(" → ");
            let entry = groups.entry(key).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += result.total_conversion_value;
        }

        let mut sequences: Vec<ConvertingSequence> = groups
            .into_iter()
            .filter(|(_, (occurrences, _))| *occurrences >= min_occurrences)
            .map(|(sequence, (occurrences, total_revenue))| ConvertingSequence {
                sequence,
                occurrences,
                total_revenue,
            })
            .collect();

        sequences.sort_by(|a, b| {
            b.occurrences.cmp(&a.occurrences).then(
                b.total_revenue
                    .partial_cmp(&a.total_revenue)
                    .unwrap_or(Ordering::Equal),
            )
        });
        sequences
    }

    /// Aggregate a batch of results into totals, mean confidence, per-channel
    /// rollups, and a top-channels ranking.
    pub fn get_attribution_summary(&self, results: &[AttributionResult]) -> AttributionSummary {
        let total_conversions = results.len() as u64;
        let total_attributed_revenue: f64 = results.iter().map(|r| r.total_attributed_value).sum();
        let average_confidence = if results.is_empty() {
            0.0
        } else {
            results
                .iter()
                .map(|r| r.attribution_confidence)
                .sum::<f64>()
                / results.len() as f64
        };

        let mut channels: HashMap<String, ChannelSummary> = HashMap::new();
        for result in results {
            for (channel, revenue) in &result.channel_attribution {
                let entry = channels.entry(channel.clone()).or_default();
                entry.revenue += revenue;
                entry.conversions += 1;
            }
        }

        let mut top_channels: Vec<ChannelRevenue> = channels
            .iter()
            .map(|(channel, summary)| ChannelRevenue {
                channel: channel.clone(),
                revenue: summary.revenue,
            })
            .collect();
        top_channels.sort_by(|a, b| {
            b.revenue
                .partial_cmp(&a.revenue)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.channel.cmp(&b.channel))
        });

        AttributionSummary {
            total_conversions,
            total_attributed_revenue,
            average_confidence,
            channels,
            top_channels,
            generated_at: Utc::now(),
        }
    }
}

fn channel_total(results: &[AttributionResult], channel: &str) -> f64 {
    results
        .iter()
        .map(|r| r.channel_attribution.get(channel).copied().unwrap_or(0.0))
        .sum()
}
