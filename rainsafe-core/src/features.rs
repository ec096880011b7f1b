//! Weather feature vector handed to predictors.
//!
//! The order of [`FEATURE_ORDER`] is the contract trained artifacts are built
//! against. Changing it requires bumping [`FEATURE_CONTRACT_VERSION`].

use std::ops::RangeInclusive;

use crate::{error::PredictError, model::WeatherObservation};

pub const FEATURE_CONTRACT_VERSION: u32 = 1;

pub const FEATURE_COUNT: usize = 5;

pub const FEATURE_ORDER: [&str; FEATURE_COUNT] = [
    "temperature_c",
    "humidity_pct",
    "precipitation_mm",
    "pressure_hpa",
    "wind_speed_mps",
];

/// Physically plausible bounds, same order as [`FEATURE_ORDER`].
const PLAUSIBLE_RANGES: [RangeInclusive<f64>; FEATURE_COUNT] = [
    -90.0..=60.0,
    0.0..=100.0,
    0.0..=500.0,
    850.0..=1090.0,
    0.0..=120.0,
];

pub const TEMPERATURE: usize = 0;
pub const HUMIDITY: usize = 1;
pub const PRECIPITATION: usize = 2;
pub const PRESSURE: usize = 3;
pub const WIND_SPEED: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherFeatureVector([f64; FEATURE_COUNT]);

impl WeatherFeatureVector {
    /// Build and validate a vector from raw values in contract order.
    pub fn new(values: [f64; FEATURE_COUNT]) -> Result<Self, PredictError> {
        for (i, value) in values.iter().enumerate() {
            if !value.is_finite() {
                return Err(PredictError::InvalidFeatureVector(format!(
                    "{} is not finite",
                    FEATURE_ORDER[i]
                )));
            }
            if !PLAUSIBLE_RANGES[i].contains(value) {
                return Err(PredictError::InvalidFeatureVector(format!(
                    "{} = {} outside plausible range {:?}",
                    FEATURE_ORDER[i], value, PLAUSIBLE_RANGES[i]
                )));
            }
        }
        Ok(Self(values))
    }

    pub fn from_observation(obs: &WeatherObservation) -> Result<Self, PredictError> {
        let fields = [
            obs.temperature_c,
            obs.humidity_pct,
            obs.precipitation_mm,
            obs.pressure_hpa,
            obs.wind_speed_mps,
        ];

        let mut values = [0.0; FEATURE_COUNT];
        for (i, field) in fields.into_iter().enumerate() {
            values[i] = field.ok_or_else(|| {
                PredictError::InvalidFeatureVector(format!("missing {}", FEATURE_ORDER[i]))
            })?;
        }

        Self::new(values)
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }

    pub fn get(&self, index: usize) -> f64 {
        self.0[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GeoPoint;
    use chrono::Utc;

    fn observation() -> WeatherObservation {
        WeatherObservation {
            location: GeoPoint::new(19.076, 72.8777),
            temperature_c: Some(27.5),
            humidity_pct: Some(88.0),
            precipitation_mm: Some(12.0),
            pressure_hpa: Some(1004.0),
            wind_speed_mps: Some(6.2),
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn builds_in_contract_order() {
        let v = WeatherFeatureVector::from_observation(&observation()).unwrap();
        assert_eq!(v.values(), &[27.5, 88.0, 12.0, 1004.0, 6.2]);
        assert_eq!(v.get(PRECIPITATION), 12.0);
        assert_eq!(FEATURE_ORDER[PRECIPITATION], "precipitation_mm");
    }

    #[test]
    fn missing_feature_is_rejected() {
        let mut obs = observation();
        obs.pressure_hpa = None;
        let err = WeatherFeatureVector::from_observation(&obs).unwrap_err();
        assert_eq!(err, PredictError::InvalidFeatureVector("missing pressure_hpa".into()));
    }

    #[test]
    fn implausible_values_are_rejected() {
        let mut obs = observation();
        obs.humidity_pct = Some(140.0);
        assert!(WeatherFeatureVector::from_observation(&obs).is_err());

        let mut obs = observation();
        obs.precipitation_mm = Some(-1.0);
        assert!(WeatherFeatureVector::from_observation(&obs).is_err());

        let mut obs = observation();
        obs.temperature_c = Some(f64::NAN);
        let err = WeatherFeatureVector::from_observation(&obs).unwrap_err();
        assert!(err.to_string().contains("temperature_c is not finite"));
    }
}
