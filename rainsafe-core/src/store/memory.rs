//! Snapshot-backed stores, filled from JSON fixtures or built in code.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::{fs, path::Path};

use crate::{
    error::StoreError,
    model::{GeoPoint, Report, WeatherObservation},
    threshold::max_clock_skew,
};

use super::{ReportStore, WeatherStore, window_start};

/// Upper bound on reports returned per query.
pub const MAX_REPORTS: usize = 50;

#[derive(Debug, Clone, Default)]
pub struct InMemoryReportStore {
    reports: Vec<Report>,
}

impl InMemoryReportStore {
    pub fn new(reports: Vec<Report>) -> Self {
        Self { reports }
    }

    /// Load a JSON array of reports.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read reports file: {}", path.display()))?;
        let reports: Vec<Report> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse reports file: {}", path.display()))?;
        Ok(Self::new(reports))
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn find_recent(
        &self,
        point: GeoPoint,
        radius_km: f64,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<Report>, StoreError> {
        let oldest = window_start(now, window);

        let mut found: Vec<Report> = self
            .reports
            .iter()
            .filter(|r| r.submitted_at >= oldest)
            .filter(|r| r.location.distance_km(&point) <= radius_km)
            .cloned()
            .collect();

        found.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        found.truncate(MAX_REPORTS);

        tracing::debug!("Found {} reports near {}", found.len(), point);
        Ok(found)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryWeatherStore {
    observations: Vec<WeatherObservation>,
}

impl InMemoryWeatherStore {
    pub fn new(observations: Vec<WeatherObservation>) -> Self {
        Self { observations }
    }

    /// Load a JSON array of observations.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read weather file: {}", path.display()))?;
        let observations: Vec<WeatherObservation> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse weather file: {}", path.display()))?;
        Ok(Self::new(observations))
    }
}

#[async_trait]
impl WeatherStore for InMemoryWeatherStore {
    async fn latest_for(
        &self,
        point: GeoPoint,
        freshness: Duration,
        now: DateTime<Utc>,
    ) -> Result<Option<WeatherObservation>, StoreError> {
        let oldest = window_start(now, freshness);
        let newest = now.checked_add_signed(max_clock_skew()).unwrap_or(DateTime::<Utc>::MAX_UTC);

        // Nearest tracked location first, then the newest observation there.
        let best = self
            .observations
            .iter()
            .filter(|o| o.location.is_valid())
            .filter(|o| o.observed_at >= oldest && o.observed_at <= newest)
            .min_by(|a, b| {
                let da = a.location.distance_km(&point);
                let db = b.location.distance_km(&point);
                da.total_cmp(&db)
                    .then_with(|| b.observed_at.cmp(&a.observed_at))
            })
            .cloned();

        match &best {
            Some(obs) => tracing::debug!("Using weather from {} observed at {}", obs.location, obs.observed_at),
            None => tracing::debug!("No fresh weather for {}", point),
        }
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ReportSeverity, Severity};

    const BENGALURU: GeoPoint = GeoPoint::new(12.9716, 77.5946);
    const MUMBAI: GeoPoint = GeoPoint::new(19.0760, 72.8777);

    fn report(location: GeoPoint, minutes_ago: i64) -> Report {
        Report {
            location,
            description: "Water entering homes".into(),
            severity: ReportSeverity::Level(Severity::Moderate),
            submitted_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    fn observation(location: GeoPoint, minutes_ago: i64, rain: f64) -> WeatherObservation {
        WeatherObservation {
            location,
            temperature_c: Some(26.0),
            humidity_pct: Some(80.0),
            precipitation_mm: Some(rain),
            pressure_hpa: Some(1008.0),
            wind_speed_mps: Some(4.0),
            observed_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[tokio::test]
    async fn reports_are_filtered_by_radius_and_window_newest_first() {
        let nearby = GeoPoint::new(12.975, 77.5946); // ~0.4 km
        let store = InMemoryReportStore::new(vec![
            report(nearby, 120),
            report(BENGALURU, 10),
            report(MUMBAI, 5),
            report(BENGALURU, 60 * 30),
        ]);

        let found = store
            .find_recent(BENGALURU, 1.0, Duration::hours(24), Utc::now())
            .await
            .unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].location, BENGALURU);
        assert_eq!(found[1].location, nearby);
    }

    #[tokio::test]
    async fn reports_are_capped() {
        let reports = (0..80).map(|i| report(BENGALURU, i)).collect();
        let store = InMemoryReportStore::new(reports);
        let found = store.find_recent(BENGALURU, 1.0, Duration::hours(24), Utc::now()).await.unwrap();
        assert_eq!(found.len(), MAX_REPORTS);
    }

    #[tokio::test]
    async fn weather_picks_nearest_location_then_latest() {
        let store = InMemoryWeatherStore::new(vec![
            observation(MUMBAI, 5, 30.0),
            observation(BENGALURU, 90, 1.0),
            observation(BENGALURU, 20, 2.0),
        ]);

        let obs = store
            .latest_for(GeoPoint::new(13.0, 77.6), Duration::hours(3), Utc::now())
            .await
            .unwrap()
            .expect("weather expected");

        assert_eq!(obs.location, BENGALURU);
        assert_eq!(obs.precipitation_mm, Some(2.0));
    }

    #[tokio::test]
    async fn stale_weather_is_absent() {
        let store = InMemoryWeatherStore::new(vec![observation(BENGALURU, 60 * 5, 1.0)]);
        let obs = store.latest_for(BENGALURU, Duration::hours(3), Utc::now()).await.unwrap();
        assert!(obs.is_none());
    }

    #[tokio::test]
    async fn windows_are_anchored_at_the_given_instant() {
        let then = Utc::now() - Duration::days(3);
        let mut old = report(BENGALURU, 0);
        old.submitted_at = then - Duration::hours(1);
        let store = InMemoryReportStore::new(vec![old]);

        let found = store.find_recent(BENGALURU, 1.0, Duration::hours(24), then).await.unwrap();
        assert_eq!(found.len(), 1);
        let found = store.find_recent(BENGALURU, 1.0, Duration::hours(24), Utc::now()).await.unwrap();
        assert!(found.is_empty());

        let mut obs = observation(BENGALURU, 0, 3.0);
        obs.observed_at = then - Duration::minutes(30);
        let store = InMemoryWeatherStore::new(vec![obs]);
        assert!(store.latest_for(BENGALURU, Duration::hours(3), then).await.unwrap().is_some());
        assert!(store.latest_for(BENGALURU, Duration::hours(3), Utc::now()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn huge_windows_do_not_overflow() {
        let store = InMemoryReportStore::new(vec![report(BENGALURU, 10)]);
        let found = store.find_recent(BENGALURU, 1.0, Duration::MAX, Utc::now()).await.unwrap();
        assert_eq!(found.len(), 1);

        let store = InMemoryWeatherStore::new(vec![observation(BENGALURU, 10, 1.0)]);
        let obs = store.latest_for(BENGALURU, Duration::MAX, Utc::now()).await.unwrap();
        assert!(obs.is_some());
    }

    #[tokio::test]
    async fn observation_with_unusable_location_is_never_nearest() {
        let broken = GeoPoint::new(f64::NAN, 77.59);
        let store = InMemoryWeatherStore::new(vec![
            observation(broken, 1, 50.0),
            observation(BENGALURU, 30, 2.0),
        ]);

        let obs = store
            .latest_for(BENGALURU, Duration::hours(3), Utc::now())
            .await
            .unwrap()
            .expect("weather expected");
        assert_eq!(obs.location, BENGALURU);
        assert_eq!(obs.precipitation_mm, Some(2.0));
    }

    #[test]
    fn loads_reports_from_json() {
        let path = std::env::temp_dir().join(format!("rainsafe-reports-{}.json", std::process::id()));
        let json = serde_json::json!([{
            "location": {"latitude": 12.97, "longitude": 77.59},
            "description": "Road flooded near the market",
            "severity": "Knee-deep",
            "submitted_at": "2024-07-01T10:00:00Z"
        }]);
        fs::write(&path, json.to_string()).unwrap();

        let store = InMemoryReportStore::from_json_file(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(store.len(), 1);
        assert_eq!(store.reports[0].severity, ReportSeverity::Text("Knee-deep".into()));
    }
}
