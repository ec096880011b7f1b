use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::StoreError,
    model::{GeoPoint, WeatherObservation},
    threshold::max_clock_skew,
};

use super::{WeatherStore, window_start};

const CURRENT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Live current conditions from OpenWeather, queried by coordinates.
#[derive(Debug, Clone)]
pub struct OpenWeatherStore {
    api_key: String,
    http: Client,
}

impl OpenWeatherStore {
    pub fn new(api_key: String) -> Self {
        Self { api_key, http: Client::new() }
    }

    async fn fetch_current(&self, point: GeoPoint) -> Result<OwCurrentResponse, StoreError> {
        let lat = point.latitude.to_string();
        let lon = point.longitude.to_string();

        let res = self
            .http
            .get(CURRENT_WEATHER_URL)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(StoreError::Unavailable(format!(
                "OpenWeather current request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| StoreError::Decode(format!("OpenWeather current JSON: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: Option<f64>,
    humidity: Option<f64>,
    pressure: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct OwWind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct OwRain {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    coord: OwCoord,
    dt: i64,
    main: OwMain,
    #[serde(default)]
    wind: OwWind,
    #[serde(default)]
    rain: OwRain,
}

impl TryFrom<OwCurrentResponse> for WeatherObservation {
    type Error = StoreError;

    fn try_from(parsed: OwCurrentResponse) -> Result<Self, Self::Error> {
        let observed_at = DateTime::from_timestamp(parsed.dt, 0).ok_or_else(|| {
            StoreError::Decode(format!("OpenWeather dt {} is not a valid timestamp", parsed.dt))
        })?;

        Ok(WeatherObservation {
            location: GeoPoint::new(parsed.coord.lat, parsed.coord.lon),
            temperature_c: parsed.main.temp,
            humidity_pct: parsed.main.humidity,
            // No rain block means no rain in the last hour.
            precipitation_mm: Some(parsed.rain.one_hour.unwrap_or(0.0)),
            pressure_hpa: parsed.main.pressure,
            wind_speed_mps: parsed.wind.speed,
            observed_at,
        })
    }
}

#[async_trait]
impl WeatherStore for OpenWeatherStore {
    async fn latest_for(
        &self,
        point: GeoPoint,
        freshness: Duration,
        now: DateTime<Utc>,
    ) -> Result<Option<WeatherObservation>, StoreError> {
        let observation = WeatherObservation::try_from(self.fetch_current(point).await?)?;

        if !is_current(&observation, freshness, now) {
            tracing::debug!(
                "OpenWeather observation at {} is outside the window ending {}",
                observation.observed_at,
                now
            );
            return Ok(None);
        }

        Ok(Some(observation))
    }
}

/// Only current conditions are served, so an instant in the past sees
/// observations made after it as unusable.
fn is_current(observation: &WeatherObservation, freshness: Duration, now: DateTime<Utc>) -> bool {
    let newest = now.checked_add_signed(max_clock_skew()).unwrap_or(DateTime::<Utc>::MAX_UTC);
    observation.observed_at >= window_start(now, freshness) && observation.observed_at <= newest
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "coord": {"lon": 72.8777, "lat": 19.076},
        "weather": [{"id": 502, "main": "Rain", "description": "heavy intensity rain"}],
        "main": {"temp": 27.1, "feels_like": 30.2, "pressure": 1002, "humidity": 94},
        "wind": {"speed": 7.7, "deg": 250},
        "rain": {"1h": 18.4},
        "dt": 1719828000,
        "name": "Mumbai"
    }"#;

    #[test]
    fn maps_current_response_to_observation() {
        let parsed: OwCurrentResponse = serde_json::from_str(SAMPLE).unwrap();
        let obs = WeatherObservation::try_from(parsed).unwrap();

        assert_eq!(obs.location, GeoPoint::new(19.076, 72.8777));
        assert_eq!(obs.temperature_c, Some(27.1));
        assert_eq!(obs.humidity_pct, Some(94.0));
        assert_eq!(obs.precipitation_mm, Some(18.4));
        assert_eq!(obs.pressure_hpa, Some(1002.0));
        assert_eq!(obs.wind_speed_mps, Some(7.7));
        assert_eq!(obs.observed_at.timestamp(), 1_719_828_000);
    }

    #[test]
    fn missing_rain_block_means_zero_precipitation() {
        let json = r#"{
            "coord": {"lon": 77.59, "lat": 12.97},
            "main": {"temp": 24.0, "pressure": 1012, "humidity": 60},
            "dt": 1719828000
        }"#;
        let parsed: OwCurrentResponse = serde_json::from_str(json).unwrap();
        let obs = WeatherObservation::try_from(parsed).unwrap();

        assert_eq!(obs.precipitation_mm, Some(0.0));
        assert_eq!(obs.wind_speed_mps, None);
    }

    #[test]
    fn out_of_range_timestamp_is_a_decode_error() {
        let json = r#"{
            "coord": {"lon": 77.59, "lat": 12.97},
            "main": {"temp": 24.0, "pressure": 1012, "humidity": 60},
            "dt": 9223372036854775807
        }"#;
        let parsed: OwCurrentResponse = serde_json::from_str(json).unwrap();
        let err = WeatherObservation::try_from(parsed).unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[test]
    fn freshness_is_measured_from_the_given_instant() {
        let parsed: OwCurrentResponse = serde_json::from_str(SAMPLE).unwrap();
        let obs = WeatherObservation::try_from(parsed).unwrap();
        let observed = obs.observed_at;

        assert!(is_current(&obs, Duration::hours(3), observed + Duration::hours(1)));
        assert!(!is_current(&obs, Duration::hours(3), observed + Duration::hours(4)));
        // Asking about a time before the observation was made.
        assert!(!is_current(&obs, Duration::hours(3), observed - Duration::days(1)));
        assert!(is_current(&obs, Duration::MAX, observed + Duration::days(365)));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(300);
        let out = truncate_body(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
