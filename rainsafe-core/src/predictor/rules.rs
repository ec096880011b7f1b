use crate::{
    error::PredictError,
    features::{HUMIDITY, PRECIPITATION, WeatherFeatureVector},
    model::RiskLevel,
};

use super::RiskPredictor;

pub const DEFAULT_HEAVY_RAIN_MM: f64 = 10.0;
pub const DEFAULT_HUMIDITY_HIGH_PCT: f64 = 80.0;

/// Fixed precipitation/humidity thresholds. Always available, needs no artifact.
#[derive(Debug, Clone)]
pub struct RuleBasedPredictor {
    heavy_rain_mm: f64,
    humidity_high_pct: f64,
}

impl RuleBasedPredictor {
    pub fn new(heavy_rain_mm: f64, humidity_high_pct: f64) -> Self {
        Self { heavy_rain_mm, humidity_high_pct }
    }
}

impl Default for RuleBasedPredictor {
    fn default() -> Self {
        Self::new(DEFAULT_HEAVY_RAIN_MM, DEFAULT_HUMIDITY_HIGH_PCT)
    }
}

impl RiskPredictor for RuleBasedPredictor {
    fn predict(&self, features: &WeatherFeatureVector) -> Result<RiskLevel, PredictError> {
        let rain = features.get(PRECIPITATION);
        let humidity = features.get(HUMIDITY);

        let level = if rain >= self.heavy_rain_mm * 4.0 {
            RiskLevel::Severe
        } else if rain >= self.heavy_rain_mm * 2.0 {
            RiskLevel::High
        } else if rain >= self.heavy_rain_mm {
            RiskLevel::Moderate
        } else if humidity >= self.humidity_high_pct {
            RiskLevel::Low
        } else {
            RiskLevel::None
        };

        Ok(level)
    }
}
