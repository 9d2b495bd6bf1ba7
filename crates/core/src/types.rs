use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of marketing interaction recorded on a customer's path to conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchpointType {
    GoogleAdsClick,
    GoogleAdsImpression,
    Ga4Session,
    OrganicSearch,
    PaidSocial,
    Email,
    Referral,
    DirectVisit,
}

impl TouchpointType {
    pub fn label(&self) -> &'static str {
        match self {
            TouchpointType::GoogleAdsClick => "google_ads_click",
            TouchpointType::GoogleAdsImpression => "google_ads_impression",
            TouchpointType::Ga4Session => "ga4_session",
            TouchpointType::OrganicSearch => "organic_search",
            TouchpointType::PaidSocial => "paid_social",
            TouchpointType::Email => "email",
            TouchpointType::Referral => "referral",
            TouchpointType::DirectVisit => "direct_visit",
        }
    }
}

impl fmt::Display for TouchpointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind of conversion a touch or journey culminated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionType {
    Purchase,
    Lead,
    Signup,
    PhoneCall,
    StoreVisit,
}

/// Weighting algorithm used to distribute conversion credit across touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributionModelType {
    FirstTouch,
    LastTouch,
    Linear,
    TimeDecay,
    PositionBased,
    Custom,
    DataDriven,
}

impl fmt::Display for AttributionModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttributionModelType::FirstTouch => "first_touch",
            AttributionModelType::LastTouch => "last_touch",
            AttributionModelType::Linear => "linear",
            AttributionModelType::TimeDecay => "time_decay",
            AttributionModelType::PositionBased => "position_based",
            AttributionModelType::Custom => "custom",
            AttributionModelType::DataDriven => "data_driven",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touchpoint_type_serde_round_trip() {
        let json = serde_json::to_string(&TouchpointType::GoogleAdsClick).unwrap();
        assert_eq!(json, "\"google_ads_click\"");
        let back: TouchpointType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TouchpointType::GoogleAdsClick);
    }

    #[test]
    fn test_model_type_display() {
        assert_eq!(AttributionModelType::PositionBased.to_string(), "position_based");
        assert_eq!(AttributionModelType::DataDriven.to_string(), "data_driven");
    }
}
