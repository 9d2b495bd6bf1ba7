//! Derived findings over attribution output — the human-readable insights and
//! blended cross-platform totals the reporting layer renders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use searchnav_core::types::TouchpointType;

use crate::analytics::AttributionSummary;
use crate::models::AttributionResult;

/// A single human-readable finding derived from attribution data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionInsight {
    pub insight_type: InsightType,
    pub severity: InsightSeverity,
    pub title: String,
    pub description: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    ChannelConcentration,
    SingleChannelDependence,
    LowConfidence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightSeverity {
    Info,
    Warning,
}

/// Attributed revenue and touch volume blended across platforms.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrossPlatformMetrics {
    pub google_ads_revenue: f64,
    pub ga4_revenue: f64,
    pub direct_revenue: f64,
    pub other_revenue: f64,
    pub google_ads_touches: u64,
    pub ga4_touches: u64,
    pub direct_touches: u64,
    pub other_touches: u64,
    pub blended_total_revenue: f64,
}

/// Produces insights and blended metrics from engine output. Pure computation,
/// no I/O.
pub struct InsightGenerator {
    concentration_threshold: f64,
    low_confidence_threshold: f64,
}

impl Default for InsightGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightGenerator {
    pub fn new() -> Self {
        Self {
            concentration_threshold: 0.5,
            low_confidence_threshold: 0.3,
        }
    }

    pub fn with_thresholds(concentration: f64, low_confidence: f64) -> Self {
        Self {
            concentration_threshold: concentration,
            low_confidence_threshold: low_confidence,
        }
    }

    /// Derive findings from a summary.
    pub fn generate_insights(&self, summary: &AttributionSummary) -> Vec<AttributionInsight> {
        let mut insights = Vec::new();
        let now = Utc::now();

        if let Some(top) = summary.top_channels.first() {
            if summary.total_attributed_revenue > 0.0 {
                let share = top.revenue / summary.total_attributed_revenue;
                if share >= self.concentration_threshold {
                    insights.push(AttributionInsight {
                        insight_type: InsightType::ChannelConcentration,
                        severity: InsightSeverity::Info,
                        title: format!("{} drives {:.0}% of attributed revenue", top.channel, share * 100.0),
                        description: format!(
                            "Channel {} accounts for {:.1} of {:.1} in attributed revenue across {} conversions.",
                            top.channel,
                            top.revenue,
                            summary.total_attributed_revenue,
                            summary.total_conversions
                        ),
                        generated_at: now,
                    });
                }
            }
        }

        if summary.channels.len() == 1 && summary.total_conversions > 0 {
            let channel = summary.channels.keys().next().cloned().unwrap_or_default();
            insights.push(AttributionInsight {
                insight_type: InsightType::SingleChannelDependence,
                severity: InsightSeverity::Warning,
                title: format!("All conversions attributed to {channel}"),
                description: format!(
                    "Every analyzed conversion touched only {channel}. Broaden tracking coverage or review journey windowing."
                ),
                generated_at: now,
            });
        }

        if summary.total_conversions > 0
            && summary.average_confidence < self.low_confidence_threshold
        {
            insights.push(AttributionInsight {
                insight_type: InsightType::LowConfidence,
                severity: InsightSeverity::Warning,
                title: format!(
                    "Average attribution confidence is {:.2}",
                    summary.average_confidence
                ),
                description: "Journeys carry few touches or sparse GCLID coverage. Attribution splits should be treated as directional.".to_string(),
                generated_at: now,
            });
        }

        insights
    }

    /// Blend attributed revenue and touch counts by platform bucket.
    pub fn cross_platform_metrics(&self, results: &[AttributionResult]) -> CrossPlatformMetrics {
        let mut metrics = CrossPlatformMetrics::default();
        for result in results {
            for touch in &result.touch_attributions {
                let revenue = touch.revenue_attributed;
                match touch.touchpoint_type {
                    TouchpointType::GoogleAdsClick | TouchpointType::GoogleAdsImpression => {
                        metrics.google_ads_revenue += revenue;
                        metrics.google_ads_touches += 1;
                    }
                    TouchpointType::Ga4Session | TouchpointType::OrganicSearch => {
                        metrics.ga4_revenue += revenue;
                        metrics.ga4_touches += 1;
                    }
                    TouchpointType::DirectVisit => {
                        metrics.direct_revenue += revenue;
                        metrics.direct_touches += 1;
                    }
                    _ => {
                        metrics.other_revenue += revenue;
                        metrics.other_touches += 1;
                    }
                }
            }
        }
        metrics.blended_total_revenue = metrics.google_ads_revenue
            + metrics.ga4_revenue
            + metrics.direct_revenue
            + metrics.other_revenue;
        metrics
    }
}
