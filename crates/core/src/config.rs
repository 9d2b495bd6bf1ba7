use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `SEARCHNAV__` and TOML config files.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub attribution: AttributionConfig,
    #[serde(default)]
    pub predictor: PredictorConfig,
}

/// Tunables for the attribution engine.
#[derive(Debug, Clone, Deserialize)]
pub struct AttributionConfig {
    #[serde(default = "default_half_life_days")]
    pub default_half_life_days: f64,
    #[serde(default = "default_weight_sum_tolerance")]
    pub weight_sum_tolerance: f64,
    #[serde(default = "default_channel")]
    pub default_channel: String,
    #[serde(default = "default_max_journey_length_days")]
    pub max_journey_length_days: f64,
}

/// Settings for the optional ML weight-prediction service.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictorConfig {
    #[serde(default = "default_predictor_enabled")]
    pub enabled: bool,
    #[serde(default = "default_model_path")]
    pub model_path: String,
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(default = "default_predictor_timeout_ms")]
    pub timeout_ms: u64,
}

// Default functions
fn default_half_life_days() -> f64 {
    7.0
}
fn default_weight_sum_tolerance() -> f64 {
    1e-6
}
fn default_channel() -> String {
    "unknown".to_string()
}
fn default_max_journey_length_days() -> f64 {
    90.0
}
fn default_predictor_enabled() -> bool {
    false
}
fn default_model_path() -> String {
    "/models/attribution.onnx".to_string()
}
fn default_confidence_threshold() -> f64 {
    0.5
}
fn default_predictor_timeout_ms() -> u64 {
    50
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            default_half_life_days: default_half_life_days(),
            weight_sum_tolerance: default_weight_sum_tolerance(),
            default_channel: default_channel(),
            max_journey_length_days: default_max_journey_length_days(),
        }
    }
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            enabled: default_predictor_enabled(),
            model_path: default_model_path(),
            confidence_threshold: default_confidence_threshold(),
            timeout_ms: default_predictor_timeout_ms(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            attribution: AttributionConfig::default(),
            predictor: PredictorConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("SEARCHNAV")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.attribution.default_half_life_days, 7.0);
        assert_eq!(cfg.attribution.default_channel, "unknown");
        assert!(!cfg.predictor.enabled);
        assert_eq!(cfg.predictor.timeout_ms, 50);
    }
}
